use std::collections::BTreeMap;

use propnet_shared::{ClassId, EntityHandle, EntityIndex, WireValue};

/// One entity's quantized property vector at the end of a tick
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    handle: EntityHandle,
    class_id: ClassId,
    values: Vec<WireValue>,
}

impl EntitySnapshot {
    pub fn new(handle: EntityHandle, class_id: ClassId, values: Vec<WireValue>) -> Self {
        Self {
            handle,
            class_id,
            values,
        }
    }

    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn values(&self) -> &[WireValue] {
        &self.values
    }
}

/// Every live entity's snapshot, keyed by slot index
#[derive(Clone, Debug, Default)]
pub struct WorldSnapshot {
    entities: BTreeMap<EntityIndex, EntitySnapshot>,
}

impl WorldSnapshot {
    pub fn insert(&mut self, entity: EntitySnapshot) {
        self.entities.insert(entity.handle().index(), entity);
    }

    /// The entity `handle` names, if its slot still holds that serial
    pub fn get(&self, handle: EntityHandle) -> Option<&EntitySnapshot> {
        self.entities
            .get(&handle.index())
            .filter(|entity| entity.handle() == handle)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.entities.values()
    }
}
