//! Entity identifiers and component rows
//!
//! Each entity is a fixed-width row with one optional slot per declared
//! component type. Identifiers are handed out monotonically by the world and
//! are never reused, so a stale id can only ever miss.

use crate::ecs::{Component, SlotIndex};
use std::any::Any;
use std::fmt;

/// Entity handle (opaque, monotonically increasing)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type ComponentSlot = Option<Box<dyn Any + Send>>;

/// One entity's component slots, indexed by [`SlotIndex`].
pub struct EntityRow {
    slots: Box<[ComponentSlot]>,
}

impl EntityRow {
    pub(crate) fn empty(width: usize) -> Self {
        Self {
            slots: (0..width).map(|_| None).collect(),
        }
    }

    /// Number of declared component types.
    pub fn width(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_occupied(&self, slot: SlotIndex) -> bool {
        matches!(self.slots.get(slot.get()), Some(Some(_)))
    }

    /// Whether every listed slot is occupied.
    pub fn occupies_all(&self, slots: &[SlotIndex]) -> bool {
        slots.iter().all(|slot| self.is_occupied(*slot))
    }

    /// Occupied slots in ascending order.
    pub fn occupied(&self) -> impl Iterator<Item = SlotIndex> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| SlotIndex::new(index))
    }

    pub fn get<T: Component>(&self, slot: SlotIndex) -> Option<&T> {
        self.slots.get(slot.get())?.as_deref()?.downcast_ref::<T>()
    }

    pub fn get_mut<T: Component>(&mut self, slot: SlotIndex) -> Option<&mut T> {
        self.slots
            .get_mut(slot.get())?
            .as_deref_mut()?
            .downcast_mut::<T>()
    }

    /// Fill an empty slot. Returns false if the slot is occupied or out of range.
    pub(crate) fn insert<T: Component>(&mut self, slot: SlotIndex, value: T) -> bool {
        self.insert_boxed(slot, Box::new(value))
    }

    pub(crate) fn insert_boxed(&mut self, slot: SlotIndex, value: Box<dyn Any + Send>) -> bool {
        match self.slots.get_mut(slot.get()) {
            Some(entry) if entry.is_none() => {
                *entry = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Empty an occupied slot. Returns false if it was already empty.
    pub(crate) fn remove(&mut self, slot: SlotIndex) -> bool {
        self.slots
            .get_mut(slot.get())
            .and_then(Option::take)
            .is_some()
    }
}

impl fmt::Debug for EntityRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRow")
            .field("width", &self.width())
            .field("occupied", &self.occupied().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Health(i32);
    crate::define_component!(Health);

    #[test]
    fn empty_row_has_no_occupied_slots() {
        let row = EntityRow::empty(3);
        assert_eq!(row.width(), 3);
        assert_eq!(row.occupied().count(), 0);
        assert!(row.occupies_all(&[]));
        assert!(!row.is_occupied(SlotIndex::new(5)));
    }

    #[test]
    fn insert_and_remove_track_occupancy() {
        let mut row = EntityRow::empty(2);
        let slot = SlotIndex::new(1);

        assert!(row.insert(slot, Health(10)));
        assert!(!row.insert(slot, Health(20)));
        assert_eq!(row.get::<Health>(slot), Some(&Health(10)));

        row.get_mut::<Health>(slot).unwrap().0 += 5;
        assert_eq!(row.get::<Health>(slot), Some(&Health(15)));
        assert_eq!(row.occupied().collect::<Vec<_>>(), vec![slot]);

        assert!(row.remove(slot));
        assert!(!row.remove(slot));
        assert!(!row.is_occupied(slot));
    }

    #[test]
    fn out_of_range_insert_is_rejected() {
        let mut row = EntityRow::empty(1);
        assert!(!row.insert(SlotIndex::new(1), Health(1)));
    }

    #[test]
    fn ids_order_by_raw_value() {
        assert!(EntityId::from_raw(1) < EntityId::from_raw(2));
        assert_eq!(EntityId::from_raw(7).to_string(), "7");
    }
}
