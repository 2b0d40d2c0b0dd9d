//! # Propnet Shared
//! Property schemas, quantization codecs, entity handles and the update wire
//! format shared between propnet-server & propnet-client.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use propnet_serde::{
    read_unsigned, read_variable, write_unsigned, write_variable, BitCounter, BitReader, BitWrite,
    BitWriter, ConstBitLength, Serde, SerdeErr, MTU_SIZE_BITS, MTU_SIZE_BYTES,
};

pub mod codec;
pub mod constants;
pub mod entity;
pub mod schema;
pub mod update;

mod diff_mask;
mod protocol;
mod sequence_list;
mod types;
mod value;
mod wrapping_number;

pub use codec::{CodecError, WireValue};
pub use diff_mask::DiffMask;
pub use entity::{EntityError, EntityHandle, EntitySlots, SerialLookup};
pub use protocol::{ClassBinding, ClassEntry, Instance, Protocol, ProtocolError, ProtocolPlugin};
pub use schema::{
    AccessError, Accessor, FlatProperty, FlattenedSchema, Lens, PropertyDescriptor, PropertyFlags,
    PropertyKind, PropertyTable, SchemaError,
};
pub use sequence_list::{SequenceError, SequenceList};
pub use types::{ClassId, EntityIndex, PropertyIndex, Serial, Tick};
pub use update::{
    Ack, PendingDelta, ProtocolViolation, UpdateKind, UpdatePacket, UpdateReader, UpdateWriter,
};
pub use value::{PropertyType, PropertyValue, ValueKind};
pub use wrapping_number::{
    sequence_greater_than, sequence_less_than, try_wrapping_diff, wrapping_diff,
    WrappingNumberError,
};
