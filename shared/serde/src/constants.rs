/// Largest payload a single update packet is budgeted for, in bytes.
pub const MTU_SIZE_BYTES: usize = 1200;
/// `MTU_SIZE_BYTES` expressed in bits
pub const MTU_SIZE_BITS: u32 = (MTU_SIZE_BYTES * 8) as u32;
