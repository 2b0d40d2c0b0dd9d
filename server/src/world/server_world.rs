use std::{any::Any, collections::BTreeMap, sync::Arc};

use log::info;

use propnet_shared::{
    codec::quantize, ClassId, EntityHandle, EntityIndex, EntitySlots, Instance, Protocol,
    SerialLookup, WireValue,
};

use crate::error::ServerError;

use super::{EntitySnapshot, WorldSnapshot};

struct EntityRecord {
    handle: EntityHandle,
    class_id: ClassId,
    instance: Instance,
}

/// Read-only view of a spawned entity
pub struct EntityRef<'w> {
    handle: EntityHandle,
    class_id: ClassId,
    instance: &'w (dyn Any + Send + Sync),
}

impl<'w> EntityRef<'w> {
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn instance(&self) -> &'w (dyn Any + Send + Sync) {
        self.instance
    }
}

/// The authoritative entities. Mutated by game code during a tick, then
/// read as a whole when updates are built.
pub struct ServerWorld {
    protocol: Arc<Protocol>,
    slots: EntitySlots,
    entities: BTreeMap<EntityIndex, EntityRecord>,
}

impl ServerWorld {
    pub fn new(protocol: Arc<Protocol>) -> Self {
        let slots = EntitySlots::new(protocol.entity_index_bits());
        Self {
            protocol,
            slots,
            entities: BTreeMap::new(),
        }
    }

    pub fn protocol(&self) -> &Arc<Protocol> {
        &self.protocol
    }

    /// Spawns `value` as an instance of its registered class.
    ///
    /// # Panics
    ///
    /// Panics if `T` isn't registered or every slot is in use.
    /// Consider using `try_spawn` for non-panicking error handling.
    pub fn spawn<T: Any + Send + Sync>(&mut self, value: T) -> EntityHandle {
        match self.try_spawn(value) {
            Ok(handle) => handle,
            Err(error) => panic!("{}", error),
        }
    }

    pub fn try_spawn<T: Any + Send + Sync>(&mut self, value: T) -> Result<EntityHandle, ServerError> {
        let class_id = self
            .protocol
            .class_of::<T>()
            .map(|class| class.id())
            .ok_or(ServerError::UnregisteredClass {
                type_name: std::any::type_name::<T>(),
            })?;
        let handle = self.slots.try_allocate()?;
        self.entities.insert(
            handle.index(),
            EntityRecord {
                handle,
                class_id,
                instance: Box::new(value),
            },
        );
        info!("spawned entity {} of class {}", handle, class_id);
        Ok(handle)
    }

    pub fn despawn(&mut self, handle: EntityHandle) -> Result<(), ServerError> {
        if !self.contains(handle) {
            return Err(ServerError::NoSuchEntity { entity: handle });
        }
        self.slots.free(handle)?;
        self.entities.remove(&handle.index());
        info!("despawned entity {}", handle);
        Ok(())
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.slots.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<EntityRef<'_>> {
        self.record(handle).map(|record| EntityRef {
            handle: record.handle,
            class_id: record.class_id,
            instance: &*record.instance,
        })
    }

    pub fn get<T: Any>(&self, handle: EntityHandle) -> Option<&T> {
        self.record(handle)
            .and_then(|record| (*record.instance).downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, handle: EntityHandle) -> Option<&mut T> {
        if !self.contains(handle) {
            return None;
        }
        self.entities
            .get_mut(&handle.index())
            .and_then(|record| (*record.instance).downcast_mut::<T>())
    }

    /// Live handles in index order
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.entities.values().map(|record| record.handle)
    }

    fn record(&self, handle: EntityHandle) -> Option<&EntityRecord> {
        self.entities
            .get(&handle.index())
            .filter(|record| record.handle == handle)
    }

    /// Quantizes every entity's flattened property vector. The result is
    /// what every connection diffs against this tick.
    pub fn snapshot(&self) -> Result<WorldSnapshot, ServerError> {
        let mut snapshot = WorldSnapshot::default();
        for record in self.entities.values() {
            let Some(class) = self.protocol.class(record.class_id) else {
                continue;
            };
            let schema = class.schema();
            let mut values: Vec<WireValue> = Vec::with_capacity(schema.len());
            for property in schema.iter() {
                let value = property
                    .read(&*record.instance)
                    .map_err(|source| ServerError::Access {
                        entity: record.handle,
                        property: property.name().to_string(),
                        source,
                    })?;
                values.push(quantize(&value, property.descriptor())?);
            }
            snapshot.insert(EntitySnapshot::new(record.handle, record.class_id, values));
        }
        Ok(snapshot)
    }
}

impl SerialLookup for ServerWorld {
    fn current_serial(&self, index: EntityIndex) -> Option<propnet_shared::Serial> {
        self.slots.current_serial(index)
    }
}
