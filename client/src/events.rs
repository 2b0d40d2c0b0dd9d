use std::vec::IntoIter;

use propnet_shared::{ClassId, EntityHandle, PropertyIndex, UpdateKind};

/// One entity's notification for an applied packet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityUpdate {
    pub entity: EntityHandle,
    pub class_id: ClassId,
    /// `Full` only for the update that created this instance
    pub kind: UpdateKind,
    /// Flattened indices written by this packet, ascending
    pub changed: Vec<PropertyIndex>,
}

impl EntityUpdate {
    pub fn is_full(&self) -> bool {
        self.kind == UpdateKind::Full
    }
}

pub struct ReplicationEvents {
    updates: Vec<EntityUpdate>,
    removals: Vec<EntityHandle>,
    empty: bool,
}

impl Default for ReplicationEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationEvents {
    pub(crate) fn new() -> Self {
        Self {
            updates: Vec::new(),
            removals: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: ReplicationEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: ReplicationEvent>(&self) -> bool {
        V::has(self)
    }

    pub(crate) fn push_update(&mut self, update: EntityUpdate) {
        self.updates.push(update);
        self.empty = false;
    }

    pub(crate) fn push_removal(&mut self, entity: EntityHandle) {
        self.removals.push(entity);
        self.empty = false;
    }

    pub(crate) fn clear(&mut self) {
        self.updates.clear();
        self.removals.clear();
        self.empty = true;
    }
}

// Event Trait
pub trait ReplicationEvent {
    type Iter;

    fn iter(events: &mut ReplicationEvents) -> Self::Iter;

    fn has(events: &ReplicationEvents) -> bool;
}

// Update Entity Event
pub struct UpdateEntityEvent;
impl ReplicationEvent for UpdateEntityEvent {
    type Iter = IntoIter<EntityUpdate>;

    fn iter(events: &mut ReplicationEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.updates);
        IntoIterator::into_iter(list)
    }

    fn has(events: &ReplicationEvents) -> bool {
        !events.updates.is_empty()
    }
}

// Remove Entity Event
pub struct RemoveEntityEvent;
impl ReplicationEvent for RemoveEntityEvent {
    type Iter = IntoIter<EntityHandle>;

    fn iter(events: &mut ReplicationEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.removals);
        IntoIterator::into_iter(list)
    }

    fn has(events: &ReplicationEvents) -> bool {
        !events.removals.is_empty()
    }
}
