use thiserror::Error;

use propnet_shared::{AccessError, EntityHandle, ProtocolViolation};

/// Errors that can occur while receiving updates or reading the mirror
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server sent something this client can't apply. The connection
    /// is closed and its mirror dropped.
    #[error(transparent)]
    Violation(#[from] ProtocolViolation),

    #[error("Connection is closed; it was dropped after a protocol violation or a disconnect")]
    Disconnected,

    #[error("Entity {entity} is not active")]
    NoSuchEntity { entity: EntityHandle },

    #[error("Class `{class}` has no property named `{name}`")]
    NoSuchProperty { class: String, name: String },

    /// A property accessor rejected the mirrored instance it was handed
    #[error("Failed to access property `{property}` of entity {entity}: {source}")]
    Access {
        entity: EntityHandle,
        property: String,
        source: AccessError,
    },
}
