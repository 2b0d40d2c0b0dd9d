use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::IntegerError, error::SerdeErr,
    serde::Serde, ConstBitLength,
};

// Runtime-width primitives. Descriptor-driven codecs only know their widths
// at schema build time, so these are the building blocks everything else
// (including the const-generic wrappers below) is written on top of.

/// Writes the lowest `bits` bits of `value`, LSB first.
pub fn write_unsigned(writer: &mut dyn BitWrite, value: u64, bits: u8) {
    if writer.is_counter() {
        writer.count_bits(u32::from(bits));
        return;
    }
    let mut value = value;
    for _ in 0..bits {
        writer.write_bit(value & 1 != 0);
        value >>= 1;
    }
}

pub fn read_unsigned(reader: &mut BitReader, bits: u8) -> Result<u64, SerdeErr> {
    let mut output: u64 = 0;
    for index in 0..bits {
        if reader.read_bit()? {
            output |= 1 << index;
        }
    }
    Ok(output)
}

/// Writes `value` in chunks of `chunk_bits`, each preceded by a "proceed"
/// bit that tells the reader whether another chunk follows.
pub fn write_variable(writer: &mut dyn BitWrite, value: u64, chunk_bits: u8) {
    let mut value = value;
    loop {
        let proceed = (value >> chunk_bits) != 0;
        writer.write_bit(proceed);
        write_unsigned(writer, value, chunk_bits);
        value >>= chunk_bits;
        if !proceed {
            return;
        }
    }
}

pub fn read_variable(reader: &mut BitReader, chunk_bits: u8) -> Result<u64, SerdeErr> {
    let mut output: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let proceed = reader.read_bit()?;
        if shift >= 64 {
            // more continuation chunks than a u64 can hold
            return Err(SerdeErr);
        }
        let chunk = read_unsigned(reader, chunk_bits)?;
        output |= chunk << shift;
        shift += u32::from(chunk_bits);
        if !proceed {
            return Ok(output);
        }
    }
}

pub fn unsigned_bit_length(bits: u8) -> u32 {
    u32::from(bits)
}

pub fn variable_bit_length(value: u64, chunk_bits: u8) -> u32 {
    let mut output: u32 = 0;
    let mut value = value;
    loop {
        // proceed bit + chunk
        output += 1 + u32::from(chunk_bits);
        value >>= chunk_bits;
        if value == 0 {
            return output;
        }
    }
}

// Const-generic wrappers

pub type UnsignedInteger<const BITS: u8> = SerdeInteger<false, false, BITS>;
pub type SignedInteger<const BITS: u8> = SerdeInteger<true, false, BITS>;
pub type UnsignedVariableInteger<const BITS: u8> = SerdeInteger<false, true, BITS>;
pub type SignedVariableInteger<const BITS: u8> = SerdeInteger<true, true, BITS>;

/// An integer with a compile-time wire layout. Signed integers carry a sign
/// bit followed by the magnitude; variable integers are chunked by `BITS`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SerdeInteger<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> {
    value: i64,
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> SerdeInteger<SIGNED, VARIABLE, BITS> {
    /// # Panics
    ///
    /// Panics if the value can't be represented with this layout.
    /// Consider using `try_new` for non-panicking error handling.
    pub fn new<T: Into<i64>>(value: T) -> Self {
        match Self::try_new(value) {
            Ok(integer) => integer,
            Err(error) => panic!("{}", error),
        }
    }

    pub fn try_new<T: Into<i64>>(value: T) -> Result<Self, IntegerError> {
        let value = value.into();
        if BITS == 0 || BITS > 64 {
            return Err(IntegerError::UnsupportedWidth { bits: BITS });
        }
        if !SIGNED && value < 0 {
            return Err(IntegerError::NegativeUnsigned { value });
        }
        if !VARIABLE && BITS < 64 && value.unsigned_abs() >= (1u64 << BITS) {
            return Err(IntegerError::OutOfRange { value, bits: BITS });
        }
        Ok(Self { value })
    }

    pub fn get(&self) -> i64 {
        self.value
    }

    pub fn set<T: Into<i64>>(&mut self, value: T) {
        *self = Self::new(value);
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> Serde for SerdeInteger<SIGNED, VARIABLE, BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        if SIGNED {
            writer.write_bit(self.value < 0);
        }
        let magnitude = self.value.unsigned_abs();
        if VARIABLE {
            write_variable(writer, magnitude, BITS);
        } else {
            write_unsigned(writer, magnitude, BITS);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let negative = SIGNED && reader.read_bit()?;
        let magnitude = if VARIABLE {
            read_variable(reader, BITS)?
        } else {
            read_unsigned(reader, BITS)?
        };
        let value = i64::try_from(magnitude).map_err(|_| SerdeErr)?;
        Ok(Self {
            value: if negative { -value } else { value },
        })
    }

    fn bit_length(&self) -> u32 {
        let sign = if SIGNED { 1 } else { 0 };
        let magnitude = self.value.unsigned_abs();
        if VARIABLE {
            sign + variable_bit_length(magnitude, BITS)
        } else {
            sign + unsigned_bit_length(BITS)
        }
    }
}

impl<const SIGNED: bool, const BITS: u8> ConstBitLength for SerdeInteger<SIGNED, false, BITS> {
    fn const_bit_length() -> u32 {
        let sign = if SIGNED { 1 } else { 0 };
        sign + u32::from(BITS)
    }
}

// Tests
