/// Width of the serial half of an entity handle
pub const SERIAL_BITS: u8 = 10;
pub const SERIAL_MASK: u16 = (1 << SERIAL_BITS) - 1;

/// Index width used by entity handle properties unless one is declared
pub const DEFAULT_ENTITY_INDEX_BITS: u8 = 11;
pub const MAX_ENTITY_INDEX_BITS: u8 = 16;

// Chunk widths of the variable-width integers in the update stream
pub const ENTITY_INDEX_CHUNK_BITS: u8 = 7;
pub const CLASS_ID_CHUNK_BITS: u8 = 4;
pub const PROPERTY_INDEX_CHUNK_BITS: u8 = 5;
pub const PROPERTY_COUNT_CHUNK_BITS: u8 = 5;
