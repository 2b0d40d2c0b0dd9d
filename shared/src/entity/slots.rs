use std::collections::VecDeque;

use log::debug;

use crate::{
    constants::{MAX_ENTITY_INDEX_BITS, SERIAL_MASK},
    types::{EntityIndex, Serial},
};

use super::{EntityError, EntityHandle};

/// Anything that knows which serial currently occupies an entity slot.
/// Handles are cross-checked against this when they are decoded.
pub trait SerialLookup {
    fn current_serial(&self, index: EntityIndex) -> Option<Serial>;

    fn resolve(&self, handle: EntityHandle) -> Option<EntityHandle> {
        match self.current_serial(handle.index()) {
            Some(serial) if serial == handle.serial() => Some(handle),
            _ => None,
        }
    }
}

struct Slot {
    serial: Serial,
    occupied: bool,
}

/// Generational slot table. Indices are handed out from a free list, the
/// slot's serial is bumped every time it is reused, and the highest index
/// representable in `index_bits` is never allocated: it is the wire
/// sentinel for "no entity".
pub struct EntitySlots {
    slots: Vec<Slot>,
    free: VecDeque<EntityIndex>,
    capacity: usize,
    len: usize,
}

impl EntitySlots {
    pub fn new(index_bits: u8) -> Self {
        let index_bits = index_bits.clamp(1, MAX_ENTITY_INDEX_BITS);
        let capacity = (1usize << index_bits) - 1;
        Self {
            slots: Vec::new(),
            free: VecDeque::new(),
            capacity,
            len: 0,
        }
    }

    /// Number of allocatable indices (the sentinel excluded)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn try_allocate(&mut self) -> Result<EntityHandle, EntityError> {
        if let Some(index) = self.free.pop_front() {
            let slot = &mut self.slots[usize::from(index)];
            slot.serial = (slot.serial + 1) & SERIAL_MASK;
            slot.occupied = true;
            self.len += 1;
            return Ok(EntityHandle::new(index, slot.serial));
        }

        if self.slots.len() >= self.capacity {
            return Err(EntityError::SlotsExhausted {
                capacity: self.capacity,
            });
        }

        // capacity < 2^16, so every pushed index fits
        let index = self.slots.len() as EntityIndex;
        self.slots.push(Slot {
            serial: 0,
            occupied: true,
        });
        self.len += 1;
        Ok(EntityHandle::new(index, 0))
    }

    /// # Panics
    ///
    /// Panics if every slot is in use.
    /// Consider using `try_allocate` for non-panicking error handling.
    pub fn allocate(&mut self) -> EntityHandle {
        match self.try_allocate() {
            Ok(handle) => handle,
            Err(error) => panic!("{}", error),
        }
    }

    pub fn free(&mut self, handle: EntityHandle) -> Result<(), EntityError> {
        if !self.contains(handle) {
            return Err(EntityError::StaleHandle { handle });
        }
        let slot = &mut self.slots[usize::from(handle.index())];
        slot.occupied = false;
        self.free.push_back(handle.index());
        self.len -= 1;
        debug!("freed entity slot {}", handle);
        Ok(())
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.resolve(handle).is_some()
    }

    /// Live handles, in index order
    pub fn iter(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(index, slot)| EntityHandle::new(index as EntityIndex, slot.serial))
    }
}

impl SerialLookup for EntitySlots {
    fn current_serial(&self, index: EntityIndex) -> Option<Serial> {
        self.slots
            .get(usize::from(index))
            .filter(|slot| slot.occupied)
            .map(|slot| slot.serial)
    }
}
