use std::{any::Any, collections::BTreeMap};

use propnet_shared::{ClassId, EntityHandle, Instance, PropertyIndex};

/// Lifecycle of one logical instance, as seen by this client
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityState {
    /// Never seen, or a serial this client hasn't received yet
    Unknown,
    /// Created by a full update and not yet touched by a delta
    Active,
    /// Active and changed by at least one delta since creation
    Updated,
    /// Removed by the server, or replaced by a newer serial at its slot
    Destroyed,
}

impl EntityState {
    pub fn is_active(&self) -> bool {
        matches!(self, EntityState::Active | EntityState::Updated)
    }
}

/// A handle property as received, and what it resolved to when last checked
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Reference {
    pub(crate) raw: Option<EntityHandle>,
    pub(crate) resolved: Option<EntityHandle>,
}

pub(crate) struct EntityRecord {
    handle: EntityHandle,
    class_id: ClassId,
    state: EntityState,
    instance: Instance,
    references: BTreeMap<PropertyIndex, Reference>,
}

impl EntityRecord {
    pub fn new(handle: EntityHandle, class_id: ClassId, instance: Instance) -> Self {
        Self {
            handle,
            class_id,
            state: EntityState::Active,
            instance,
            references: BTreeMap::new(),
        }
    }

    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn instance(&self) -> &(dyn Any + Send + Sync) {
        &*self.instance
    }

    pub(crate) fn instance_mut(&mut self) -> &mut (dyn Any + Send + Sync) {
        &mut *self.instance
    }

    pub(crate) fn mark_updated(&mut self) {
        self.state = EntityState::Updated;
    }

    pub(crate) fn references(&self) -> impl Iterator<Item = (PropertyIndex, Reference)> + '_ {
        self.references
            .iter()
            .map(|(index, reference)| (*index, *reference))
    }

    pub(crate) fn set_reference(&mut self, index: PropertyIndex, reference: Reference) {
        self.references.insert(index, reference);
    }
}
