use thiserror::Error;

use crate::{sequence_greater_than, types::Tick};

/// Errors that can occur during SequenceList operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Records must be pushed in strictly increasing tick order
    #[error("Tick {id} is not newer than the last tick {last} in the SequenceList")]
    OutOfOrder { id: Tick, last: Tick },
}

/// Records keyed by wrapping tick, kept oldest first.
pub struct SequenceList<T> {
    list: Vec<(Tick, T)>,
}

impl<T> Default for SequenceList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SequenceList<T> {
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn front(&self) -> Option<&(Tick, T)> {
        self.list.first()
    }

    pub fn back(&self) -> Option<&(Tick, T)> {
        self.list.last()
    }

    pub fn pop_front(&mut self) -> Option<(Tick, T)> {
        if self.list.is_empty() {
            None
        } else {
            Some(self.list.remove(0))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Tick, T)> {
        self.list.iter()
    }

    pub fn contains_scan_from_back(&self, id: Tick) -> bool {
        for (old_id, _) in self.list.iter().rev() {
            if *old_id == id {
                return true;
            }
            if sequence_greater_than(id, *old_id) {
                return false;
            }
        }
        false
    }

    /// Appends a record for a tick newer than every stored one.
    pub fn try_push_back(&mut self, id: Tick, item: T) -> Result<(), SequenceError> {
        if let Some((last, _)) = self.list.last() {
            if !sequence_greater_than(id, *last) {
                return Err(SequenceError::OutOfOrder { id, last: *last });
            }
        }
        self.list.push((id, item));
        Ok(())
    }

    /// Appends a record for a tick newer than every stored one.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not newer than the last stored tick.
    pub fn push_back(&mut self, id: Tick, item: T) {
        if let Err(error) = self.try_push_back(id, item) {
            panic!("{}", error);
        }
    }

    /// Removes every record up to and including `id`, returning the record
    /// stored for `id` itself if there was one.
    pub fn remove_through(&mut self, id: Tick) -> Option<T> {
        let mut found = None;
        while let Some((old_id, _)) = self.list.first() {
            if sequence_greater_than(*old_id, id) {
                break;
            }
            let (old_id, item) = self.list.remove(0);
            if old_id == id {
                found = Some(item);
            }
        }
        found
    }

    /// Drops records older than `oldest_kept`.
    pub fn remove_older_than(&mut self, oldest_kept: Tick) {
        self.list
            .retain(|(old_id, _)| !sequence_greater_than(oldest_kept, *old_id));
    }
}
