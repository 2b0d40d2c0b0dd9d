use std::fmt;

use crate::{
    constants::SERIAL_MASK,
    types::{EntityIndex, Serial},
};

/// A weak reference to an entity: its slot index plus the slot's serial at
/// the time the handle was taken. Once the slot is freed and reused the
/// serial moves on and the handle stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    index: EntityIndex,
    serial: Serial,
}

impl EntityHandle {
    /// The serial is truncated to `SERIAL_BITS`.
    pub fn new(index: EntityIndex, serial: Serial) -> Self {
        Self {
            index,
            serial: serial & SERIAL_MASK,
        }
    }

    pub fn index(&self) -> EntityIndex {
        self.index
    }

    pub fn serial(&self) -> Serial {
        self.serial
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.serial)
    }
}
