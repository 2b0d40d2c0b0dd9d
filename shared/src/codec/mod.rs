mod error;
mod handle;
mod property_codec;
mod quantize;
mod wire_value;

pub use error::CodecError;
pub use handle::{
    decode_handle, handle_bit_length, read_handle, resolve_handle, sentinel_index, write_handle,
};
pub use property_codec::{
    decode, dequantize, encode, quantize, read_wire, same_on_wire, wire_bit_length, write_wire,
};
pub use quantize::{
    dequantize_angle, dequantize_float, quantize_angle, quantize_float, wrap_degrees,
};
pub use wire_value::WireValue;
