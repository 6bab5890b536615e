use crate::ecs::{ServiceActionId, SystemId};
use std::collections::BTreeMap;

/// Handle types minted by a [`SystemRegistry`].
pub(crate) trait RawHandle: Copy + Ord {
    fn from_raw(raw: u64) -> Self;
}

impl RawHandle for SystemId {
    fn from_raw(raw: u64) -> Self {
        SystemId::from_raw(raw)
    }
}

impl RawHandle for ServiceActionId {
    fn from_raw(raw: u64) -> Self {
        ServiceActionId::from_raw(raw)
    }
}

/// Registrations keyed by handle, iterated in ascending handle order.
///
/// Handles come from a monotonically increasing counter and are never
/// reused after removal.
pub(crate) struct SystemRegistry<H, T> {
    entries: BTreeMap<H, T>,
    next_id: u64,
}

impl<H: RawHandle, T> SystemRegistry<H, T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn register(&mut self, entry: T) -> H {
        let handle = H::from_raw(self.next_id);
        self.next_id += 1;
        self.entries.insert(handle, entry);
        handle
    }

    pub fn remove(&mut self, handle: H) -> Option<T> {
        self.entries.remove(&handle)
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        self.entries.get(&handle)
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.entries.get_mut(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (H, &mut T)> {
        self.entries.iter_mut().map(|(handle, entry)| (*handle, entry))
    }
}
