//! # Propnet Serde
//! Bit-level reading & writing shared by every propnet crate.
//! Values are packed least-significant-bit first, with no byte alignment
//! between fields.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_counter;
mod bit_reader;
mod bit_writer;
mod constants;
mod error;
mod integer;
mod serde;

pub use bit_counter::BitCounter;
pub use bit_reader::BitReader;
pub use bit_writer::{BitWrite, BitWriter};
pub use constants::{MTU_SIZE_BITS, MTU_SIZE_BYTES};
pub use error::{IntegerError, SerdeErr};
pub use integer::{
    read_unsigned, read_variable, unsigned_bit_length, variable_bit_length, write_unsigned,
    write_variable, SerdeInteger, SignedInteger, SignedVariableInteger, UnsignedInteger,
    UnsignedVariableInteger,
};
pub use serde::{ConstBitLength, Serde};
