use propnet_serde::SerdeErr;
use thiserror::Error;

use crate::{
    codec::CodecError,
    entity::EntityHandle,
    types::{ClassId, EntityIndex},
};

/// A malformed or inconsistent update stream. Fatal for the connection it
/// arrived on, and only for that one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// The reader ran past the end of the packet
    #[error("Update packet ended mid-record")]
    Truncated,

    #[error("Update names unregistered class id {class_id}")]
    UnknownClass { class_id: u64 },

    #[error("Entity index {index} is beyond the highest valid index {max}")]
    EntityIndexOutOfRange { index: u64, max: EntityIndex },

    /// Update records are sorted by entity index, each entity at most once
    #[error("Entity index {index} follows {previous}; update records must be strictly increasing")]
    EntityIndexNotIncreasing { index: EntityIndex, previous: EntityIndex },

    #[error("Delta for class `{class}` changes {count} properties, the schema has {len}")]
    PropertyCountOutOfBounds { class: String, count: u64, len: usize },

    #[error("Property index {index} is out of bounds for class `{class}` ({len} properties)")]
    PropertyIndexOutOfBounds { class: String, index: u64, len: usize },

    #[error("Property index {index} follows {previous} in class `{class}`; indices must be strictly increasing")]
    PropertyIndexNotIncreasing {
        class: String,
        index: u64,
        previous: u64,
    },

    #[error("String property `{property}` is not valid UTF-8")]
    InvalidUtf8 { property: String },

    /// Any other value that can't be decoded with its descriptor
    #[error("Malformed value: {reason}")]
    MalformedValue { reason: String },

    /// Deltas only apply on top of a full update for the same entity
    #[error("Delta update for entity {entity}, which is not active")]
    DeltaForInactiveEntity { entity: EntityHandle },

    #[error("Entity {entity} is class {expected}, but the update says class {actual}")]
    ClassMismatch {
        entity: EntityHandle,
        expected: ClassId,
        actual: ClassId,
    },
}

impl From<SerdeErr> for ProtocolViolation {
    fn from(_: SerdeErr) -> Self {
        ProtocolViolation::Truncated
    }
}

impl From<CodecError> for ProtocolViolation {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::EndOfBuffer => ProtocolViolation::Truncated,
            CodecError::InvalidUtf8 { property } => ProtocolViolation::InvalidUtf8 { property },
            other => ProtocolViolation::MalformedValue {
                reason: other.to_string(),
            },
        }
    }
}
