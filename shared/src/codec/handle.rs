use log::{debug, warn};
use propnet_serde::{read_unsigned, write_unsigned, BitReader, BitWrite, SerdeErr};

use crate::{
    constants::SERIAL_BITS,
    entity::{EntityHandle, SerialLookup},
    types::EntityIndex,
};

/// The index reserved for "no entity": all ones in `index_bits`
pub fn sentinel_index(index_bits: u8) -> EntityIndex {
    ((1u32 << index_bits) - 1) as EntityIndex
}

pub fn handle_bit_length(index_bits: u8) -> u32 {
    u32::from(index_bits) + u32::from(SERIAL_BITS)
}

/// Writes `index_bits` of slot index then `SERIAL_BITS` of serial. `None`
/// is written as the sentinel index with a zero serial.
pub fn write_handle(writer: &mut dyn BitWrite, handle: Option<EntityHandle>, index_bits: u8) {
    let sentinel = sentinel_index(index_bits);
    let (index, serial) = match handle {
        Some(handle) if handle.index() < sentinel => (handle.index(), handle.serial()),
        Some(handle) => {
            warn!(
                "entity {} can't be addressed with {} index bits, sending as none",
                handle, index_bits
            );
            (sentinel, 0)
        }
        None => (sentinel, 0),
    };
    write_unsigned(writer, u64::from(index), index_bits);
    write_unsigned(writer, u64::from(serial), SERIAL_BITS);
}

/// Reads a handle without checking it against any slot table
pub fn read_handle(reader: &mut BitReader, index_bits: u8) -> Result<Option<EntityHandle>, SerdeErr> {
    let index = read_unsigned(reader, index_bits)? as EntityIndex;
    let serial = read_unsigned(reader, SERIAL_BITS)? as u16;
    if index == sentinel_index(index_bits) {
        Ok(None)
    } else {
        Ok(Some(EntityHandle::new(index, serial)))
    }
}

/// Cross-checks a raw handle against the receiver's slot serials. A serial
/// mismatch or unknown slot resolves to `None`; that's an expected race
/// with destruction, not an error.
pub fn resolve_handle(raw: Option<EntityHandle>, lookup: &dyn SerialLookup) -> Option<EntityHandle> {
    let handle = raw?;
    let resolved = lookup.resolve(handle);
    if resolved.is_none() {
        debug!("entity handle {} no longer resolves", handle);
    }
    resolved
}

pub fn decode_handle(
    reader: &mut BitReader,
    index_bits: u8,
    lookup: &dyn SerialLookup,
) -> Result<Option<EntityHandle>, SerdeErr> {
    let raw = read_handle(reader, index_bits)?;
    Ok(resolve_handle(raw, lookup))
}
