use log::warn;
use propnet_serde::{read_unsigned, write_unsigned, BitReader, BitWrite};

use crate::{
    entity::SerialLookup,
    schema::{PropertyDescriptor, PropertyKind},
    value::PropertyValue,
};

use super::{
    handle::{handle_bit_length, read_handle, resolve_handle, write_handle},
    quantize::{dequantize_angle, dequantize_float, quantize_angle, quantize_float},
    CodecError, WireValue,
};

fn max_string_len(descriptor: &PropertyDescriptor) -> usize {
    (1usize << descriptor.bit_count()) - 1
}

/// Maps a value onto its wire form for `descriptor`. Out-of-range integers
/// are clamped and over-long strings truncated at a char boundary, both
/// with a warning; floats clamp silently as part of quantization.
pub fn quantize(value: &PropertyValue, descriptor: &PropertyDescriptor) -> Result<WireValue, CodecError> {
    let bits = descriptor.bit_count();
    match (descriptor.kind(), value) {
        (PropertyKind::Int, PropertyValue::Int(value)) => {
            let (low, high) = descriptor.int_range().unwrap_or((i64::MIN, i64::MAX));
            let clamped = (*value).clamp(low, high);
            if clamped != *value {
                warn!(
                    "property `{}`: {} is outside {}..={}, clamped to {}",
                    descriptor.name(),
                    value,
                    low,
                    high,
                    clamped
                );
            }
            if descriptor.is_signed() {
                Ok(WireValue::Signed(clamped))
            } else {
                Ok(WireValue::Unsigned(clamped.unsigned_abs()))
            }
        }
        (PropertyKind::Bool, PropertyValue::Bool(value)) => Ok(WireValue::Unsigned(u64::from(*value))),
        (PropertyKind::Float, PropertyValue::Float(value)) => {
            let (low, high) = descriptor.float_range().unwrap_or((0.0, 1.0));
            Ok(WireValue::Unsigned(quantize_float(*value, low, high, bits)))
        }
        (PropertyKind::Angle, PropertyValue::Float(value)) => {
            Ok(WireValue::Unsigned(quantize_angle(*value, bits)))
        }
        (PropertyKind::Vector, PropertyValue::Vector(axes)) => {
            let (low, high) = descriptor.float_range().unwrap_or((0.0, 1.0));
            Ok(WireValue::Vector(
                axes.map(|axis| quantize_float(axis, low, high, bits)),
            ))
        }
        (PropertyKind::String, PropertyValue::String(value)) => {
            let max_len = max_string_len(descriptor);
            if value.len() <= max_len {
                return Ok(WireValue::Text(value.clone()));
            }
            let mut end = max_len;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            warn!(
                "property `{}`: {} byte string truncated to {} bytes",
                descriptor.name(),
                value.len(),
                end
            );
            Ok(WireValue::Text(value[..end].to_string()))
        }
        (PropertyKind::EntityHandle, PropertyValue::Entity(handle)) => Ok(WireValue::Handle(*handle)),
        (PropertyKind::NestedTable, _) => Err(CodecError::NotALeaf {
            property: descriptor.name().to_string(),
        }),
        (kind, value) => Err(CodecError::ValueKindMismatch {
            property: descriptor.name().to_string(),
            expected: kind,
            actual: value.kind(),
        }),
    }
}

/// Maps a wire value back to a runtime value. Entity handles are checked
/// against `lookup` and resolve to `None` when their slot has moved on.
pub fn dequantize(
    wire: &WireValue,
    descriptor: &PropertyDescriptor,
    lookup: &dyn SerialLookup,
) -> Result<PropertyValue, CodecError> {
    let bits = descriptor.bit_count();
    match (descriptor.kind(), wire) {
        (PropertyKind::Int, WireValue::Unsigned(value)) => {
            Ok(PropertyValue::Int(i64::try_from(*value).unwrap_or(i64::MAX)))
        }
        (PropertyKind::Int, WireValue::Signed(value)) => Ok(PropertyValue::Int(*value)),
        (PropertyKind::Bool, WireValue::Unsigned(value)) => Ok(PropertyValue::Bool(*value != 0)),
        (PropertyKind::Float, WireValue::Unsigned(bucket)) => {
            let (low, high) = descriptor.float_range().unwrap_or((0.0, 1.0));
            Ok(PropertyValue::Float(dequantize_float(*bucket, low, high, bits)))
        }
        (PropertyKind::Angle, WireValue::Unsigned(bucket)) => {
            Ok(PropertyValue::Float(dequantize_angle(*bucket, bits)))
        }
        (PropertyKind::Vector, WireValue::Vector(buckets)) => {
            let (low, high) = descriptor.float_range().unwrap_or((0.0, 1.0));
            Ok(PropertyValue::Vector(
                buckets.map(|bucket| dequantize_float(bucket, low, high, bits)),
            ))
        }
        (PropertyKind::String, WireValue::Text(value)) => Ok(PropertyValue::String(value.clone())),
        (PropertyKind::EntityHandle, WireValue::Handle(raw)) => {
            Ok(PropertyValue::Entity(resolve_handle(*raw, lookup)))
        }
        (kind, _) => Err(CodecError::WireMismatch {
            property: descriptor.name().to_string(),
            kind,
        }),
    }
}

pub fn write_wire(writer: &mut dyn BitWrite, wire: &WireValue, descriptor: &PropertyDescriptor) {
    let bits = descriptor.bit_count();
    match wire {
        WireValue::Unsigned(value) => write_unsigned(writer, *value, bits),
        WireValue::Signed(value) => {
            writer.write_bit(*value < 0);
            write_unsigned(writer, value.unsigned_abs(), bits);
        }
        WireValue::Vector(axes) => {
            for axis in axes {
                write_unsigned(writer, *axis, bits);
            }
        }
        WireValue::Text(value) => {
            write_unsigned(writer, value.len() as u64, bits);
            for byte in value.as_bytes() {
                writer.write_byte(*byte);
            }
        }
        WireValue::Handle(handle) => write_handle(writer, *handle, bits),
    }
}

pub fn read_wire(reader: &mut BitReader, descriptor: &PropertyDescriptor) -> Result<WireValue, CodecError> {
    let bits = descriptor.bit_count();
    match descriptor.kind() {
        PropertyKind::Int => {
            let (low, high) = descriptor.int_range().unwrap_or((i64::MIN, i64::MAX));
            if descriptor.is_signed() {
                let negative = reader.read_bit()?;
                let magnitude = i64::try_from(read_unsigned(reader, bits)?).unwrap_or(i64::MAX);
                let value = if negative { -magnitude } else { magnitude };
                Ok(WireValue::Signed(value.clamp(low, high)))
            } else {
                let value = read_unsigned(reader, bits)?;
                Ok(WireValue::Unsigned(value.min(high.unsigned_abs())))
            }
        }
        PropertyKind::Bool | PropertyKind::Float | PropertyKind::Angle => {
            Ok(WireValue::Unsigned(read_unsigned(reader, bits)?))
        }
        PropertyKind::Vector => {
            let mut axes = [0u64; 3];
            for axis in axes.iter_mut() {
                *axis = read_unsigned(reader, bits)?;
            }
            Ok(WireValue::Vector(axes))
        }
        PropertyKind::String => {
            let length = read_unsigned(reader, bits)?;
            if u64::from(reader.bits_remaining()) < length * 8 {
                return Err(CodecError::EndOfBuffer);
            }
            let mut bytes = Vec::with_capacity(length as usize);
            for _ in 0..length {
                bytes.push(reader.read_byte()?);
            }
            String::from_utf8(bytes)
                .map(WireValue::Text)
                .map_err(|_| CodecError::InvalidUtf8 {
                    property: descriptor.name().to_string(),
                })
        }
        PropertyKind::EntityHandle => Ok(WireValue::Handle(read_handle(reader, bits)?)),
        PropertyKind::NestedTable => Err(CodecError::NotALeaf {
            property: descriptor.name().to_string(),
        }),
    }
}

/// Number of bits `write_wire` takes for this value
pub fn wire_bit_length(wire: &WireValue, descriptor: &PropertyDescriptor) -> u32 {
    let bits = u32::from(descriptor.bit_count());
    match wire {
        WireValue::Unsigned(_) => bits,
        WireValue::Signed(_) => 1 + bits,
        WireValue::Vector(_) => 3 * bits,
        WireValue::Text(value) => bits + 8 * value.len() as u32,
        WireValue::Handle(_) => handle_bit_length(descriptor.bit_count()),
    }
}

pub fn encode(
    value: &PropertyValue,
    descriptor: &PropertyDescriptor,
    writer: &mut dyn BitWrite,
) -> Result<(), CodecError> {
    let wire = quantize(value, descriptor)?;
    write_wire(writer, &wire, descriptor);
    Ok(())
}

pub fn decode(
    reader: &mut BitReader,
    descriptor: &PropertyDescriptor,
    lookup: &dyn SerialLookup,
) -> Result<PropertyValue, CodecError> {
    let wire = read_wire(reader, descriptor)?;
    dequantize(&wire, descriptor, lookup)
}

/// Whether two values would put identical bits on the wire
pub fn same_on_wire(a: &PropertyValue, b: &PropertyValue, descriptor: &PropertyDescriptor) -> bool {
    match (quantize(a, descriptor), quantize(b, descriptor)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
