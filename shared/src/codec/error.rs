use propnet_serde::SerdeErr;
use thiserror::Error;

use crate::{schema::PropertyKind, types::ClassId, value::ValueKind};

/// Errors that can occur while encoding or decoding a property value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The value's kind doesn't match the descriptor it's encoded with
    #[error("Property `{property}` of kind {expected:?} can't encode a value of kind {actual:?}")]
    ValueKindMismatch {
        property: String,
        expected: PropertyKind,
        actual: ValueKind,
    },

    /// Nested tables are flattened away and never reach the codec
    #[error("Property `{property}` is a nested table and has no wire encoding")]
    NotALeaf { property: String },

    /// A wire value of one shape was handed to a descriptor of another
    #[error("Property `{property}` of kind {kind:?} can't hold this wire value")]
    WireMismatch { property: String, kind: PropertyKind },

    #[error("No class is registered with id {class_id}")]
    UnknownClass { class_id: ClassId },

    /// An update names a property index the class schema doesn't have
    #[error("Class `{class}` has no property at index {index}")]
    UnknownProperty { class: String, index: usize },

    /// A full update must carry every property of the class, in order
    #[error("Full update of class `{class}` carries {actual} values, the schema has {expected}")]
    IncompleteFullUpdate {
        class: String,
        expected: usize,
        actual: usize,
    },

    /// The reader ran past the end of the packet
    #[error("Ran past the end of the packet")]
    EndOfBuffer,

    #[error("String property `{property}` is not valid UTF-8")]
    InvalidUtf8 { property: String },
}

impl From<SerdeErr> for CodecError {
    fn from(_: SerdeErr) -> Self {
        CodecError::EndOfBuffer
    }
}
