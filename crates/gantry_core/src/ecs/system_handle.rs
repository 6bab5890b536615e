use std::fmt;

/// Handle assigned to each registered system.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(u64);

impl SystemId {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Return the raw value backing this handle.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system#{}", self.0)
    }
}

/// Handle assigned to each registered service-action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceActionId(u64);

impl ServiceActionId {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ServiceActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action#{}", self.0)
    }
}
