use propnet_serde::{read_unsigned, read_variable, BitReader, Serde};

use crate::{
    codec::read_wire,
    constants::{
        CLASS_ID_CHUNK_BITS, ENTITY_INDEX_CHUNK_BITS, PROPERTY_COUNT_CHUNK_BITS,
        PROPERTY_INDEX_CHUNK_BITS, SERIAL_BITS,
    },
    entity::EntityHandle,
    protocol::Protocol,
    types::{ClassId, EntityIndex, PropertyIndex, Serial, Tick},
};

use super::{PendingDelta, ProtocolViolation, UpdateKind, UpdatePacket};

/// Parses and validates update packets against a protocol. Nothing is
/// applied here; a packet that parses is structurally sound.
pub struct UpdateReader;

impl UpdateReader {
    /// `max_index` is the highest entity index this receiver accepts.
    pub fn read_packet(
        protocol: &Protocol,
        bytes: &[u8],
        max_index: EntityIndex,
    ) -> Result<UpdatePacket, ProtocolViolation> {
        let mut reader = BitReader::new(bytes);
        let tick = Tick::de(&mut reader)?;

        let mut removals = Vec::new();
        // read RemovalContinue bit
        while bool::de(&mut reader)? {
            removals.push(Self::read_entity(&mut reader, max_index)?);
        }

        let mut updates: Vec<PendingDelta> = Vec::new();
        // read UpdateContinue bit
        while bool::de(&mut reader)? {
            let update = Self::read_update(&mut reader, protocol, tick, max_index)?;
            if let Some(previous) = updates.last() {
                if update.entity.index() <= previous.entity.index() {
                    return Err(ProtocolViolation::EntityIndexNotIncreasing {
                        index: update.entity.index(),
                        previous: previous.entity.index(),
                    });
                }
            }
            updates.push(update);
        }

        Ok(UpdatePacket {
            tick,
            removals,
            updates,
        })
    }

    fn read_entity(reader: &mut BitReader, max_index: EntityIndex) -> Result<EntityHandle, ProtocolViolation> {
        let index = read_variable(reader, ENTITY_INDEX_CHUNK_BITS)?;
        if index > u64::from(max_index) {
            return Err(ProtocolViolation::EntityIndexOutOfRange {
                index,
                max: max_index,
            });
        }
        let serial = read_unsigned(reader, SERIAL_BITS)? as Serial;
        Ok(EntityHandle::new(index as EntityIndex, serial))
    }

    fn read_update(
        reader: &mut BitReader,
        protocol: &Protocol,
        tick: Tick,
        max_index: EntityIndex,
    ) -> Result<PendingDelta, ProtocolViolation> {
        let entity = Self::read_entity(reader, max_index)?;
        let class_id = read_variable(reader, CLASS_ID_CHUNK_BITS)?;
        let class = ClassId::try_from(class_id)
            .ok()
            .and_then(|id| protocol.class(id))
            .ok_or(ProtocolViolation::UnknownClass { class_id })?;
        let schema = class.schema();
        let kind = UpdateKind::de(reader)?;

        let mut changed = Vec::new();
        let mut values = Vec::new();
        match kind {
            UpdateKind::Full => {
                for property in schema.iter() {
                    changed.push(property.index());
                    values.push(read_wire(reader, property.descriptor())?);
                }
            }
            UpdateKind::Delta => {
                let count = read_variable(reader, PROPERTY_COUNT_CHUNK_BITS)?;
                if count > schema.len() as u64 {
                    return Err(ProtocolViolation::PropertyCountOutOfBounds {
                        class: class.name().to_string(),
                        count,
                        len: schema.len(),
                    });
                }
                let mut previous: Option<u64> = None;
                for _ in 0..count {
                    let index = read_variable(reader, PROPERTY_INDEX_CHUNK_BITS)?;
                    if index >= schema.len() as u64 {
                        return Err(ProtocolViolation::PropertyIndexOutOfBounds {
                            class: class.name().to_string(),
                            index,
                            len: schema.len(),
                        });
                    }
                    if let Some(previous) = previous {
                        if index <= previous {
                            return Err(ProtocolViolation::PropertyIndexNotIncreasing {
                                class: class.name().to_string(),
                                index,
                                previous,
                            });
                        }
                    }
                    previous = Some(index);

                    let index = index as PropertyIndex;
                    let Some(property) = schema.property(index) else {
                        return Err(ProtocolViolation::PropertyIndexOutOfBounds {
                            class: class.name().to_string(),
                            index: u64::from(index),
                            len: schema.len(),
                        });
                    };
                    changed.push(index);
                    values.push(read_wire(reader, property.descriptor())?);
                }
            }
        }

        Ok(PendingDelta {
            tick,
            entity,
            class_id: class.id(),
            kind,
            changed,
            values,
        })
    }
}
