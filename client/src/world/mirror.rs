use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::{debug, info};

use propnet_shared::{
    codec::dequantize, constants::SERIAL_MASK, ClassId, EntityHandle, EntityIndex,
    FlattenedSchema, PropertyIndex, PropertyValue, Protocol, ProtocolViolation, Serial,
    SerialLookup, UpdateKind, UpdatePacket, WireValue,
};

use crate::{error::ClientError, events::EntityUpdate};

use super::entity_record::{EntityRecord, EntityState, Reference};

/// What applying one packet did, in dispatch order
#[derive(Default)]
pub(crate) struct AppliedPacket {
    pub(crate) removed: Vec<EntityHandle>,
    pub(crate) updated: Vec<EntityUpdate>,
}

/// The client's copy of every entity in its scope, keyed by slot
#[derive(Default)]
pub(crate) struct EntityMirror {
    entities: BTreeMap<EntityIndex, EntityRecord>,
    // serial of the last instance destroyed at each slot
    retired: HashMap<EntityIndex, Serial>,
}

impl EntityMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&EntityRecord> {
        self.entities
            .get(&handle.index())
            .filter(|record| record.handle() == handle)
    }

    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.entities.values().map(|record| record.handle())
    }

    pub fn state(&self, handle: EntityHandle) -> EntityState {
        if let Some(record) = self.get(handle) {
            return record.state();
        }
        let destroyed = self.retired.get(&handle.index()) == Some(&handle.serial())
            || self
                .entities
                .get(&handle.index())
                .is_some_and(|record| serial_is_older(handle.serial(), record.handle().serial()));
        if destroyed {
            EntityState::Destroyed
        } else {
            EntityState::Unknown
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.retired.clear();
    }

    fn remove_at(&mut self, index: EntityIndex) -> Option<EntityRecord> {
        let record = self.entities.remove(&index)?;
        self.retired.insert(index, record.handle().serial());
        Some(record)
    }

    /// Applies a parsed packet. Nothing is touched until the whole packet
    /// has been checked against the mirror; then removals, creations and
    /// values are applied in that order.
    pub(crate) fn apply(
        &mut self,
        protocol: &Protocol,
        packet: &UpdatePacket,
    ) -> Result<AppliedPacket, ClientError> {
        self.validate(protocol, packet)?;

        let mut applied = AppliedPacket::default();
        // slots whose occupant changed; references into them are re-resolved
        let mut touched = BTreeSet::new();

        for handle in &packet.removals {
            if self.get(*handle).is_some() {
                self.remove_at(handle.index());
                touched.insert(handle.index());
                applied.removed.push(*handle);
            } else {
                debug!("ignoring removal of entity {}, which isn't mirrored", handle);
            }
        }

        let mut created = HashSet::new();
        for update in &packet.updates {
            if update.kind != UpdateKind::Full || self.get(update.entity).is_some() {
                continue;
            }
            let index = update.entity.index();
            if let Some(previous) = self.remove_at(index) {
                debug!("entity {} replaced by {}", previous.handle(), update.entity);
                applied.removed.push(previous.handle());
            }
            let class = protocol
                .class(update.class_id)
                .ok_or(ProtocolViolation::UnknownClass {
                    class_id: u64::from(update.class_id),
                })?;
            self.entities.insert(
                index,
                EntityRecord::new(update.entity, class.id(), class.construct()),
            );
            touched.insert(index);
            created.insert(index);
        }

        let mut notices = BTreeMap::new();
        for update in &packet.updates {
            let schema = schema_of(protocol, update.class_id)?;
            let index = update.entity.index();

            let mut values = Vec::with_capacity(update.changed.len());
            let mut references = Vec::new();
            for (property, wire) in update.changed.iter().zip(&update.values) {
                let descriptor = schema
                    .property(*property)
                    .ok_or(ProtocolViolation::PropertyIndexOutOfBounds {
                        class: schema.class_name().to_string(),
                        index: u64::from(*property),
                        len: schema.len(),
                    })?
                    .descriptor();
                let value = dequantize(wire, descriptor, &*self).map_err(ProtocolViolation::from)?;
                if let (WireValue::Handle(raw), PropertyValue::Entity(resolved)) = (wire, &value) {
                    references.push((
                        *property,
                        Reference {
                            raw: *raw,
                            resolved: *resolved,
                        },
                    ));
                }
                values.push((*property, value));
            }

            let record = self
                .entities
                .get_mut(&index)
                .ok_or(ProtocolViolation::DeltaForInactiveEntity {
                    entity: update.entity,
                })?;
            for (property, value) in values {
                write_property(record, schema, property, value)?;
            }
            for (property, reference) in references {
                record.set_reference(property, reference);
            }

            let kind = if created.contains(&index) {
                UpdateKind::Full
            } else {
                record.mark_updated();
                UpdateKind::Delta
            };
            notices.insert(
                index,
                EntityUpdate {
                    entity: update.entity,
                    class_id: update.class_id,
                    kind,
                    changed: update.changed.clone(),
                },
            );
        }

        if !touched.is_empty() {
            self.refresh_references(protocol, &touched, &mut notices)?;
        }

        if !created.is_empty() {
            info!("mirrored {} new entities", created.len());
        }
        applied.updated = notices.into_values().collect();
        Ok(applied)
    }

    fn validate(&self, protocol: &Protocol, packet: &UpdatePacket) -> Result<(), ProtocolViolation> {
        let removed: HashSet<EntityHandle> = packet.removals.iter().copied().collect();
        for update in &packet.updates {
            if protocol.class(update.class_id).is_none() {
                return Err(ProtocolViolation::UnknownClass {
                    class_id: u64::from(update.class_id),
                });
            }
            let active = self
                .get(update.entity)
                .filter(|_| !removed.contains(&update.entity));
            match (update.kind, active) {
                (UpdateKind::Delta, None) => {
                    return Err(ProtocolViolation::DeltaForInactiveEntity {
                        entity: update.entity,
                    });
                }
                (_, Some(record)) if record.class_id() != update.class_id => {
                    return Err(ProtocolViolation::ClassMismatch {
                        entity: update.entity,
                        expected: record.class_id(),
                        actual: update.class_id,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Re-resolves handle properties pointing into `touched` slots and
    /// folds the ones that changed into `notices` as incremental updates.
    fn refresh_references(
        &mut self,
        protocol: &Protocol,
        touched: &BTreeSet<EntityIndex>,
        notices: &mut BTreeMap<EntityIndex, EntityUpdate>,
    ) -> Result<(), ClientError> {
        let mut refreshed = Vec::new();
        for (index, record) in &self.entities {
            for (property, reference) in record.references() {
                let Some(raw) = reference.raw else {
                    continue;
                };
                if !touched.contains(&raw.index()) {
                    continue;
                }
                let resolved = self.resolve(raw);
                if resolved != reference.resolved {
                    refreshed.push((*index, property, raw, resolved));
                }
            }
        }

        for (index, property, raw, resolved) in refreshed {
            let Some(record) = self.entities.get_mut(&index) else {
                continue;
            };
            let schema = schema_of(protocol, record.class_id())?;
            write_property(record, schema, property, PropertyValue::Entity(resolved))?;
            record.set_reference(
                property,
                Reference {
                    raw: Some(raw),
                    resolved,
                },
            );
            debug!(
                "entity {}: reference {} now resolves to {:?}",
                record.handle(),
                raw,
                resolved
            );

            let notice = notices.entry(index).or_insert_with(|| EntityUpdate {
                entity: record.handle(),
                class_id: record.class_id(),
                kind: UpdateKind::Delta,
                changed: Vec::new(),
            });
            if let Err(position) = notice.changed.binary_search(&property) {
                notice.changed.insert(position, property);
            }
        }
        Ok(())
    }
}

impl SerialLookup for EntityMirror {
    fn current_serial(&self, index: EntityIndex) -> Option<Serial> {
        self.entities.get(&index).map(|record| record.handle().serial())
    }
}

fn schema_of(protocol: &Protocol, class_id: ClassId) -> Result<&FlattenedSchema, ProtocolViolation> {
    protocol
        .class(class_id)
        .map(|class| class.schema().as_ref())
        .ok_or(ProtocolViolation::UnknownClass {
            class_id: u64::from(class_id),
        })
}

fn write_property(
    record: &mut EntityRecord,
    schema: &FlattenedSchema,
    property: PropertyIndex,
    value: PropertyValue,
) -> Result<(), ClientError> {
    let entity = record.handle();
    schema
        .write(record.instance_mut(), property, value)
        .map_err(|source| ClientError::Access {
            entity,
            property: schema
                .property(property)
                .map(|flat| flat.name().to_string())
                .unwrap_or_default(),
            source,
        })
}

// serials wrap within their width; older means less than half the range behind
fn serial_is_older(serial: Serial, current: Serial) -> bool {
    let behind = current.wrapping_sub(serial) & SERIAL_MASK;
    behind != 0 && behind <= SERIAL_MASK / 2
}
