//! Entity Component System core types.
//!
//! The component and service type sets of a world are closed: they are
//! declared once through a [`RegistryBuilder`], validated, and mapped to
//! dense slot indices. Entities are rows of optional component slots;
//! services live in a second row of slots whose first entry is always the
//! [`Manager`]. Systems and service-actions are matched against both rows
//! by predicates derived from their parameter tuples, and a [`World`]
//! sweeps over them until its stop signal is raised, either on the calling
//! thread or on a [`Scheduler`] worker.

mod builder;
mod component;
mod entity;
mod params;
mod registry;
mod scheduler;
mod service;
mod system;
mod system_handle;
mod system_registry;
mod world;

pub use builder::EntityBuilder;
pub use component::{Component, Service, TypeKey};
pub use entity::{EntityId, EntityRow};
pub use params::{ComponentSet, ServiceParam, ServiceSet};
pub use registry::{
    first_repeated, ConfigError, Registry, RegistryBuilder, SlotIndex, TypeDescriptor, TypeKind,
};
pub use scheduler::{Scheduler, SchedulerError};
pub use service::{Manager, ServiceSlots, StopSignal};
pub use system::{
    ActionInvoker, EntityInvoker, RawServiceAction, RawSystem, RowPredicate, ServicePredicate,
};
pub use system_handle::{ServiceActionId, SystemId};
pub(crate) use system_registry::SystemRegistry;
pub use world::{Registration, World, WorldError};

/// Add an entity to the world from a list of component values.
///
/// Expands to [`World::add_entity`] and returns its `Result`.
#[macro_export]
macro_rules! spawn {
    ($world:expr $(, $component:expr)* $(,)?) => {{
        let builder = $crate::ecs::EntityBuilder::new()
            $(.with($component))*;
        $world.add_entity(builder)
    }};
}
