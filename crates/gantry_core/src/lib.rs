//! Gantry Engine Core
//!
//! Contains the fundamental simulation machinery:
//! - Entity Component System over closed, validated type sets
//! - System and service-action matching/dispatch
//! - Synchronous and background sweep loops with cooperative stop

pub mod ecs;

pub use ecs::{
    Component, EntityBuilder, EntityId, Manager, Registry, RegistryBuilder, Scheduler,
    SchedulerError, Service, ServiceActionId, SystemId, World, WorldError,
};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
