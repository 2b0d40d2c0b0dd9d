use propnet_serde::{write_unsigned, write_variable, BitCounter, BitWrite, BitWriter, Serde};

use crate::{
    codec::{write_wire, CodecError},
    constants::{
        CLASS_ID_CHUNK_BITS, ENTITY_INDEX_CHUNK_BITS, PROPERTY_COUNT_CHUNK_BITS,
        PROPERTY_INDEX_CHUNK_BITS, SERIAL_BITS,
    },
    entity::EntityHandle,
    protocol::Protocol,
    schema::FlattenedSchema,
    types::Tick,
};

use super::{PendingDelta, UpdateKind};

/// Writes update packets: tick header, then a continue-bit framed list of
/// removals, then a continue-bit framed list of entity records.
pub struct UpdateWriter;

impl UpdateWriter {
    pub fn write_header(writer: &mut dyn BitWrite, tick: Tick) {
        tick.ser(writer);
    }

    fn write_entity(writer: &mut dyn BitWrite, entity: EntityHandle) {
        write_variable(writer, u64::from(entity.index()), ENTITY_INDEX_CHUNK_BITS);
        write_unsigned(writer, u64::from(entity.serial()), SERIAL_BITS);
    }

    pub fn write_removal(writer: &mut dyn BitWrite, entity: EntityHandle) {
        // write RemovalContinue bit
        true.ser(writer);
        Self::write_entity(writer, entity);
    }

    /// Writes one entity record, including its leading continue bit.
    pub fn write_update(
        writer: &mut dyn BitWrite,
        delta: &PendingDelta,
        schema: &FlattenedSchema,
    ) -> Result<(), CodecError> {
        // write UpdateContinue bit
        true.ser(writer);
        Self::write_entity(writer, delta.entity);
        write_variable(writer, u64::from(delta.class_id), CLASS_ID_CHUNK_BITS);
        delta.kind.ser(writer);

        match delta.kind {
            UpdateKind::Full => {
                if delta.values.len() != schema.len() {
                    return Err(CodecError::IncompleteFullUpdate {
                        class: schema.class_name().to_string(),
                        expected: schema.len(),
                        actual: delta.values.len(),
                    });
                }
                for (property, value) in schema.iter().zip(&delta.values) {
                    write_wire(writer, value, property.descriptor());
                }
            }
            UpdateKind::Delta => {
                write_variable(writer, delta.changed.len() as u64, PROPERTY_COUNT_CHUNK_BITS);
                for (index, value) in delta.changed.iter().zip(&delta.values) {
                    let property = schema.property(*index).ok_or_else(|| CodecError::UnknownProperty {
                        class: schema.class_name().to_string(),
                        index: usize::from(*index),
                    })?;
                    write_variable(writer, u64::from(*index), PROPERTY_INDEX_CHUNK_BITS);
                    write_wire(writer, value, property.descriptor());
                }
            }
        }
        Ok(())
    }

    /// Ends a removal or update list
    pub fn finish_section(writer: &mut dyn BitWrite) {
        false.ser(writer);
    }

    /// Bits `write_update` takes for this record
    pub fn update_bit_length(delta: &PendingDelta, schema: &FlattenedSchema) -> Result<u32, CodecError> {
        let mut counter = BitCounter::new(0, u32::MAX);
        Self::write_update(&mut counter, delta, schema)?;
        Ok(counter.bits_needed())
    }

    pub fn removal_bit_length(entity: EntityHandle) -> u32 {
        let mut counter = BitCounter::new(0, u32::MAX);
        Self::write_removal(&mut counter, entity);
        counter.bits_needed()
    }

    /// Header plus both section terminators
    pub fn packet_overhead_bits() -> u32 {
        16 + 2
    }

    pub fn write_packet(
        protocol: &Protocol,
        tick: Tick,
        removals: &[EntityHandle],
        updates: &[PendingDelta],
    ) -> Result<Vec<u8>, CodecError> {
        let mut writer = BitWriter::new();
        Self::write_header(&mut writer, tick);

        for entity in removals {
            Self::write_removal(&mut writer, *entity);
        }
        Self::finish_section(&mut writer);

        for delta in updates {
            let class = protocol
                .class(delta.class_id)
                .ok_or(CodecError::UnknownClass {
                    class_id: delta.class_id,
                })?;
            Self::write_update(&mut writer, delta, class.schema())?;
        }
        Self::finish_section(&mut writer);

        Ok(writer.to_bytes())
    }
}
