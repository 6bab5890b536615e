// component.rs - Component and service type markers
//
// Types are identified by `TypeId` at configuration time and mapped to a
// dense slot index by the `Registry`; nothing downstream hashes a TypeId.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a declared type.
///
/// Equality and hashing use the `TypeId` only; the name is carried for
/// diagnostics.
#[derive(Copy, Clone, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Plain per-entity data.
///
/// Implementors must be plain copyable records: no identity, no behavior,
/// no borrowed data. Use [`define_component!`](crate::define_component).
pub trait Component: 'static + Copy + Send {
    fn key() -> TypeKey {
        TypeKey::of::<Self>()
    }
}

/// Stateful singleton shared by systems and service-actions.
///
/// Services are moved into the world on install and moved out on uninstall.
/// Use [`define_service!`](crate::define_service).
pub trait Service: Sized + Send + 'static {
    fn key() -> TypeKey {
        TypeKey::of::<Self>()
    }
}

/// Mark one or more types as components.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Copy)]
/// struct Position { x: i32, y: i32 }
///
/// define_component!(Position);
/// ```
#[macro_export]
macro_rules! define_component {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ecs::Component for $ty {}
        )+
    };
}

/// Mark one or more types as services.
#[macro_export]
macro_rules! define_service {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ecs::Service for $ty {}
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    struct Mass;
    define_component!(Mass);

    struct Clock;
    define_service!(Clock);

    #[test]
    fn keys_compare_by_type() {
        assert_eq!(Mass::key(), TypeKey::of::<Mass>());
        assert_ne!(Mass::key(), Clock::key());
        assert!(Mass::key().name().ends_with("Mass"));
    }
}
