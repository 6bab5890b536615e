// registry.rs - Closed component/service type sets
//
// The registry is built once, validated once, and then only answers
// "which slot does this type live in". Component slots are numbered from 0
// in declaration order; service slot 0 always belongs to the manager and
// declared services follow from 1.

use crate::ecs::{Component, Manager, Service, TypeKey};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Dense index of a declared type inside an entity row or the service slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(usize);

impl SlotIndex {
    /// Service slot permanently occupied by the [`Manager`].
    pub const MANAGER: SlotIndex = SlotIndex(0);

    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a declared type is per-entity data or a shared singleton.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Component,
    Service,
}

/// One entry of the configuration list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    key: TypeKey,
    kind: TypeKind,
}

impl TypeDescriptor {
    pub fn component<T: Component>() -> Self {
        Self {
            key: T::key(),
            kind: TypeKind::Component,
        }
    }

    pub fn service<T: Service>() -> Self {
        Self {
            key: T::key(),
            kind: TypeKind::Service,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }
}

/// Errors detected while declaring type sets or resolving a registration
/// against them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("component type `{ty}` is declared more than once")]
    DuplicateComponent { ty: TypeKey },

    #[error("service type `{ty}` is declared more than once")]
    DuplicateService { ty: TypeKey },

    #[error("type `{ty}` is declared both as a component and as a service")]
    ComponentServiceOverlap { ty: TypeKey },

    /// `Manager` implements neither marker trait, so the typed builder
    /// methods cannot produce this; it guards descriptors built in-crate.
    #[error("type `{ty}` collides with the manager service")]
    ManagerCollision { ty: TypeKey },

    #[error("component type `{ty}` is not declared")]
    UndeclaredComponent { ty: TypeKey },

    #[error("service type `{ty}` is not declared")]
    UndeclaredService { ty: TypeKey },

    #[error("type `{ty}` is referenced more than once")]
    RepeatedInSubset { ty: TypeKey },
}

/// First key that appears twice in `keys`, if any.
pub fn first_repeated(keys: &[TypeKey]) -> Option<TypeKey> {
    for (position, key) in keys.iter().enumerate() {
        if keys[..position].contains(key) {
            return Some(*key);
        }
    }
    None
}

/// Builder for the closed type sets of a world.
#[derive(Default)]
pub struct RegistryBuilder {
    descriptors: Vec<TypeDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Declare a component type.
    pub fn component<T: Component>(self) -> Self {
        self.descriptor(TypeDescriptor::component::<T>())
    }

    /// Declare a service type.
    pub fn service<T: Service>(self) -> Self {
        self.descriptor(TypeDescriptor::service::<T>())
    }

    /// Declare a type from a prebuilt descriptor.
    pub fn descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Validate the declarations and assign slot indices.
    pub fn build(self) -> Result<Registry, ConfigError> {
        let manager = TypeKey::of::<Manager>();
        let mut components: Vec<TypeKey> = Vec::new();
        let mut services: Vec<TypeKey> = Vec::new();

        for descriptor in self.descriptors {
            let ty = descriptor.key();
            if ty == manager {
                return Err(ConfigError::ManagerCollision { ty });
            }

            match descriptor.kind() {
                TypeKind::Component => {
                    if components.contains(&ty) {
                        return Err(ConfigError::DuplicateComponent { ty });
                    }
                    components.push(ty);
                }
                TypeKind::Service => {
                    if services.contains(&ty) {
                        return Err(ConfigError::DuplicateService { ty });
                    }
                    services.push(ty);
                }
            }
        }

        if let Some(ty) = components.iter().find(|ty| services.contains(ty)) {
            return Err(ConfigError::ComponentServiceOverlap { ty: *ty });
        }

        let component_lookup = components
            .iter()
            .enumerate()
            .map(|(index, ty)| (*ty, SlotIndex::new(index)))
            .collect();

        let service_lookup = std::iter::once((manager, SlotIndex::MANAGER))
            .chain(
                services
                    .iter()
                    .enumerate()
                    .map(|(index, ty)| (*ty, SlotIndex::new(index + 1))),
            )
            .collect();

        Ok(Registry {
            components,
            services,
            component_lookup,
            service_lookup,
        })
    }
}

/// Validated, immutable type sets.
#[derive(Clone, Debug)]
pub struct Registry {
    components: Vec<TypeKey>,
    services: Vec<TypeKey>,
    component_lookup: HashMap<TypeKey, SlotIndex>,
    service_lookup: HashMap<TypeKey, SlotIndex>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Declared component types, in slot order.
    pub fn components(&self) -> &[TypeKey] {
        &self.components
    }

    /// Declared service types, in slot order (the manager is not listed).
    pub fn services(&self) -> &[TypeKey] {
        &self.services
    }

    /// Width of an entity row.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Number of service slots, manager included.
    pub fn service_slot_count(&self) -> usize {
        self.services.len() + 1
    }

    pub fn component_index(&self, ty: TypeKey) -> Result<SlotIndex, ConfigError> {
        self.component_lookup
            .get(&ty)
            .copied()
            .ok_or(ConfigError::UndeclaredComponent { ty })
    }

    /// Slot of a service type; the manager resolves to [`SlotIndex::MANAGER`].
    pub fn service_index(&self, ty: TypeKey) -> Result<SlotIndex, ConfigError> {
        self.service_lookup
            .get(&ty)
            .copied()
            .ok_or(ConfigError::UndeclaredService { ty })
    }

    /// Resolve the component subset of a registration.
    pub fn resolve_components(&self, keys: &[TypeKey]) -> Result<Vec<SlotIndex>, ConfigError> {
        if let Some(ty) = first_repeated(keys) {
            return Err(ConfigError::RepeatedInSubset { ty });
        }
        keys.iter().map(|ty| self.component_index(*ty)).collect()
    }

    /// Resolve the service subset of a registration.
    pub fn resolve_services(&self, keys: &[TypeKey]) -> Result<Vec<SlotIndex>, ConfigError> {
        if let Some(ty) = first_repeated(keys) {
            return Err(ConfigError::RepeatedInSubset { ty });
        }
        keys.iter().map(|ty| self.service_index(*ty)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    struct Position;
    #[derive(Clone, Copy)]
    struct Velocity;
    #[derive(Clone, Copy)]
    struct Both;
    crate::define_component!(Position, Velocity, Both);

    struct Clock;
    struct Canvas;
    crate::define_service!(Clock, Canvas, Both);

    #[test]
    fn assigns_slots_in_declaration_order() {
        let registry = Registry::builder()
            .component::<Velocity>()
            .component::<Position>()
            .service::<Canvas>()
            .service::<Clock>()
            .build()
            .unwrap();

        assert_eq!(registry.component_count(), 2);
        assert_eq!(registry.service_slot_count(), 3);
        assert_eq!(
            registry.component_index(Velocity::key()),
            Ok(SlotIndex::new(0))
        );
        assert_eq!(
            registry.component_index(Position::key()),
            Ok(SlotIndex::new(1))
        );
        assert_eq!(
            registry.service_index(TypeKey::of::<Manager>()),
            Ok(SlotIndex::MANAGER)
        );
        assert_eq!(registry.service_index(Canvas::key()), Ok(SlotIndex::new(1)));
        assert_eq!(registry.service_index(Clock::key()), Ok(SlotIndex::new(2)));
    }

    #[test]
    fn rejects_duplicate_components() {
        let err = Registry::builder()
            .component::<Position>()
            .component::<Velocity>()
            .component::<Position>()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateComponent {
                ty: Position::key()
            }
        );
    }

    #[test]
    fn rejects_duplicate_services() {
        let err = Registry::builder()
            .service::<Clock>()
            .service::<Clock>()
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateService { ty: Clock::key() });
    }

    #[test]
    fn rejects_component_service_overlap() {
        let err = Registry::builder()
            .component::<Both>()
            .service::<Clock>()
            .descriptor(TypeDescriptor::service::<Both>())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ComponentServiceOverlap {
                ty: TypeKey::of::<Both>()
            }
        );
    }

    #[test]
    fn rejects_manager_descriptor() {
        let manager = TypeDescriptor {
            key: TypeKey::of::<Manager>(),
            kind: TypeKind::Service,
        };
        let err = Registry::builder()
            .service::<Clock>()
            .descriptor(manager)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ManagerCollision {
                ty: TypeKey::of::<Manager>()
            }
        );
    }

    #[test]
    fn empty_registry_still_has_manager_slot() {
        let registry = RegistryBuilder::new().build().unwrap();
        assert_eq!(registry.component_count(), 0);
        assert_eq!(registry.service_slot_count(), 1);
        assert!(registry.services().is_empty());
    }

    #[test]
    fn resolve_rejects_undeclared_and_repeated_types() {
        let registry = Registry::builder()
            .component::<Position>()
            .service::<Clock>()
            .build()
            .unwrap();

        assert_eq!(
            registry.resolve_components(&[Velocity::key()]),
            Err(ConfigError::UndeclaredComponent {
                ty: Velocity::key()
            })
        );
        assert_eq!(
            registry.resolve_components(&[Position::key(), Position::key()]),
            Err(ConfigError::RepeatedInSubset {
                ty: Position::key()
            })
        );
        assert_eq!(
            registry.resolve_services(&[Canvas::key()]),
            Err(ConfigError::UndeclaredService { ty: Canvas::key() })
        );
        assert_eq!(
            registry.resolve_services(&[TypeKey::of::<Manager>(), Clock::key()]),
            Ok(vec![SlotIndex::MANAGER, SlotIndex::new(1)])
        );
    }

    #[test]
    fn component_types_are_not_services() {
        let registry = Registry::builder()
            .component::<Position>()
            .build()
            .unwrap();
        assert!(registry.service_index(TypeKey::of::<Position>()).is_err());
    }

    #[test]
    fn first_repeated_finds_second_occurrence() {
        let keys = [Position::key(), Velocity::key(), Position::key()];
        assert_eq!(first_repeated(&keys), Some(Position::key()));
        assert_eq!(first_repeated(&keys[..2]), None);
    }
}
