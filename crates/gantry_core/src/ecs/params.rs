//! Typed parameter sets for systems and service-actions
//!
//! A system names its inputs as two tuples: the components it reads and
//! writes on each entity, and the services it borrows for the call. Both
//! tuples are resolved to slot indices once, at registration.
//!
//! Components are copied out of the row and written back after the call.
//! Services are moved out of their slots and put back after the call, so the
//! callback sees plain `&mut` tuples and nothing else in the world.

use crate::ecs::{Component, EntityRow, Manager, Service, ServiceSlots, SlotIndex, TypeKey};

/// A tuple of distinct component types.
pub trait ComponentSet: Sized + Send + 'static {
    /// Keys in tuple order.
    fn keys() -> Vec<TypeKey>;

    /// Copy the components out of `row`. `None` if any slot is empty.
    fn read(row: &EntityRow, slots: &[SlotIndex]) -> Option<Self>;

    /// Write the components back into `row`.
    fn write(self, row: &mut EntityRow, slots: &[SlotIndex]);
}

/// A type that may appear in a service tuple: any declared [`Service`] or
/// the [`Manager`].
pub trait ServiceParam: Send + 'static {
    fn key() -> TypeKey;
}

impl<T: Service> ServiceParam for T {
    fn key() -> TypeKey {
        <T as Service>::key()
    }
}

impl ServiceParam for Manager {
    fn key() -> TypeKey {
        TypeKey::of::<Manager>()
    }
}

/// A tuple of distinct service types.
pub trait ServiceSet: Sized + Send + 'static {
    fn keys() -> Vec<TypeKey>;

    /// Move every service out of its slot, or none of them.
    fn take(services: &mut ServiceSlots, slots: &[SlotIndex]) -> Option<Self>;

    /// Put the services back into the slots they were taken from.
    fn restore(self, services: &mut ServiceSlots, slots: &[SlotIndex]);
}

impl ComponentSet for () {
    fn keys() -> Vec<TypeKey> {
        Vec::new()
    }

    fn read(_row: &EntityRow, _slots: &[SlotIndex]) -> Option<Self> {
        Some(())
    }

    fn write(self, _row: &mut EntityRow, _slots: &[SlotIndex]) {}
}

impl ServiceSet for () {
    fn keys() -> Vec<TypeKey> {
        Vec::new()
    }

    fn take(_services: &mut ServiceSlots, _slots: &[SlotIndex]) -> Option<Self> {
        Some(())
    }

    fn restore(self, _services: &mut ServiceSlots, _slots: &[SlotIndex]) {}
}

macro_rules! impl_component_set {
    ($($ty:ident $index:tt),+) => {
        impl<$($ty: Component),+> ComponentSet for ($($ty,)+) {
            fn keys() -> Vec<TypeKey> {
                vec![$(<$ty as Component>::key()),+]
            }

            fn read(row: &EntityRow, slots: &[SlotIndex]) -> Option<Self> {
                Some(($(*row.get::<$ty>(*slots.get($index)?)?,)+))
            }

            #[allow(non_snake_case)]
            fn write(self, row: &mut EntityRow, slots: &[SlotIndex]) {
                let ($($ty,)+) = self;
                $(
                    if let Some(target) = slots
                        .get($index)
                        .and_then(|slot| row.get_mut::<$ty>(*slot))
                    {
                        *target = $ty;
                    }
                )+
            }
        }
    };
}

macro_rules! impl_service_set {
    ($($ty:ident $index:tt),+) => {
        impl<$($ty: ServiceParam),+> ServiceSet for ($($ty,)+) {
            fn keys() -> Vec<TypeKey> {
                vec![$(<$ty as ServiceParam>::key()),+]
            }

            fn take(services: &mut ServiceSlots, slots: &[SlotIndex]) -> Option<Self> {
                // Each slot was resolved from the type read out of it, so
                // once occupancy holds every take below succeeds.
                if slots.len() != [$($index),+].len() || !services.occupies_all(slots) {
                    return None;
                }
                Some(($(services.take::<$ty>(slots[$index])?,)+))
            }

            #[allow(non_snake_case)]
            fn restore(self, services: &mut ServiceSlots, slots: &[SlotIndex]) {
                let ($($ty,)+) = self;
                $(
                    if let Some(slot) = slots.get($index) {
                        let restored = services.put(*slot, $ty).is_ok();
                        debug_assert!(restored, "service slot {} refilled twice", slot);
                    }
                )+
            }
        }
    };
}

macro_rules! impl_param_sets {
    ($($ty:ident $index:tt),+) => {
        impl_component_set!($($ty $index),+);
        impl_service_set!($($ty $index),+);
    };
}

impl_param_sets!(A 0);
impl_param_sets!(A 0, B 1);
impl_param_sets!(A 0, B 1, C 2);
impl_param_sets!(A 0, B 1, C 2, D 3);
impl_param_sets!(A 0, B 1, C 2, D 3, E 4);
impl_param_sets!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_param_sets!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_param_sets!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::StopSignal;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Position(i32);
    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Velocity(i32);
    crate::define_component!(Position, Velocity);

    #[derive(Debug, PartialEq)]
    struct Ticks(u32);
    crate::define_service!(Ticks);

    #[test]
    fn component_tuple_copies_out_and_back() {
        let mut row = EntityRow::empty(2);
        let slots = [SlotIndex::new(1), SlotIndex::new(0)];
        row.insert(slots[0], Position(1));
        row.insert(slots[1], Velocity(4));

        let (mut position, velocity) =
            <(Position, Velocity)>::read(&row, &slots).unwrap();
        position.0 += velocity.0;
        (position, velocity).write(&mut row, &slots);

        assert_eq!(row.get::<Position>(slots[0]), Some(&Position(5)));
        assert_eq!(
            <(Position, Velocity) as ComponentSet>::keys(),
            vec![TypeKey::of::<Position>(), TypeKey::of::<Velocity>()]
        );
    }

    #[test]
    fn component_tuple_read_misses_on_empty_slot() {
        let mut row = EntityRow::empty(2);
        row.insert(SlotIndex::new(0), Position(0));
        let slots = [SlotIndex::new(0), SlotIndex::new(1)];
        assert!(<(Position, Velocity)>::read(&row, &slots).is_none());
    }

    #[test]
    fn service_tuple_is_all_or_nothing() {
        let mut services = ServiceSlots::new(2, Manager::new(StopSignal::new()));
        let slots = [SlotIndex::MANAGER, SlotIndex::new(1)];

        assert!(<(Manager, Ticks)>::take(&mut services, &slots).is_none());
        assert!(services.is_occupied(SlotIndex::MANAGER));

        services.put(SlotIndex::new(1), Ticks(2)).unwrap();
        let (manager, mut ticks) = <(Manager, Ticks)>::take(&mut services, &slots).unwrap();
        assert!(!services.is_occupied(SlotIndex::MANAGER));
        ticks.0 += 1;
        (manager, ticks).restore(&mut services, &slots);

        assert!(services.occupies_all(&slots));
        assert_eq!(services.get::<Ticks>(SlotIndex::new(1)), Some(&Ticks(3)));
    }

    #[test]
    fn empty_sets_always_resolve() {
        let row = EntityRow::empty(0);
        assert_eq!(<()>::read(&row, &[]), Some(()));
        assert!(<() as ComponentSet>::keys().is_empty());
    }
}
