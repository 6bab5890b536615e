//! Service slots and the manager service
//!
//! Slot 0 always holds the [`Manager`]; declared services follow in
//! registry order. A slot keeps its typed cell once created, so moving a
//! service out for an invocation and back in again never reallocates.

use crate::ecs::SlotIndex;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop flag shared between a sweep loop and its controllers.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Returns true if this call raised it.
    pub fn request(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Implicit control service, always installed in [`SlotIndex::MANAGER`].
///
/// Systems and service-actions request it like any other service.
#[derive(Clone, Debug)]
pub struct Manager {
    stop: StopSignal,
}

impl Manager {
    pub(crate) fn new(stop: StopSignal) -> Self {
        Self { stop }
    }

    /// Ask the sweep loop to halt after the current sweep.
    ///
    /// Idempotent; returns true only for the call that raised the flag.
    pub fn request_stop(&self) -> bool {
        self.stop.request()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_requested()
    }
}

trait ErasedSlot: Send {
    fn is_occupied(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + 'static> ErasedSlot for Option<T> {
    fn is_occupied(&self) -> bool {
        self.is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One optional slot per declared service plus the manager slot.
pub struct ServiceSlots {
    slots: Vec<Option<Box<dyn ErasedSlot>>>,
}

impl ServiceSlots {
    pub(crate) fn new(width: usize, manager: Manager) -> Self {
        let mut slots: Vec<Option<Box<dyn ErasedSlot>>> =
            (0..width.max(1)).map(|_| None).collect();
        slots[SlotIndex::MANAGER.get()] = Some(Box::new(Some(manager)));
        Self { slots }
    }

    /// Number of slots, manager included.
    pub fn width(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_occupied(&self, slot: SlotIndex) -> bool {
        self.slots
            .get(slot.get())
            .and_then(|entry| entry.as_deref())
            .is_some_and(|cell| cell.is_occupied())
    }

    /// Whether every listed slot is occupied.
    pub fn occupies_all(&self, slots: &[SlotIndex]) -> bool {
        slots.iter().all(|slot| self.is_occupied(*slot))
    }

    pub fn get<T: Send + 'static>(&self, slot: SlotIndex) -> Option<&T> {
        self.cell::<T>(slot)?.as_ref()
    }

    pub fn get_mut<T: Send + 'static>(&mut self, slot: SlotIndex) -> Option<&mut T> {
        self.cell_mut::<T>(slot)?.as_mut()
    }

    /// Fill an empty slot, handing the value back if it is occupied.
    pub(crate) fn put<T: Send + 'static>(&mut self, slot: SlotIndex, value: T) -> Result<(), T> {
        if self.is_occupied(slot) {
            return Err(value);
        }
        let Some(entry) = self.slots.get_mut(slot.get()) else {
            return Err(value);
        };

        if let Some(cell) = entry
            .as_deref_mut()
            .and_then(|erased| erased.as_any_mut().downcast_mut::<Option<T>>())
        {
            *cell = Some(value);
            return Ok(());
        }

        *entry = Some(Box::new(Some(value)));
        Ok(())
    }

    /// Move the value out of a slot, leaving it empty.
    pub(crate) fn take<T: Send + 'static>(&mut self, slot: SlotIndex) -> Option<T> {
        self.cell_mut::<T>(slot)?.take()
    }

    fn cell<T: Send + 'static>(&self, slot: SlotIndex) -> Option<&Option<T>> {
        self.slots
            .get(slot.get())?
            .as_deref()?
            .as_any()
            .downcast_ref::<Option<T>>()
    }

    fn cell_mut<T: Send + 'static>(&mut self, slot: SlotIndex) -> Option<&mut Option<T>> {
        self.slots
            .get_mut(slot.get())?
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<Option<T>>()
    }
}

impl fmt::Debug for ServiceSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let occupied: Vec<usize> = (0..self.width())
            .filter(|index| self.is_occupied(SlotIndex::new(*index)))
            .collect();
        f.debug_struct("ServiceSlots")
            .field("width", &self.width())
            .field("occupied", &occupied)
            .finish()
    }
}
