use thiserror::Error;

use propnet_shared::{AccessError, CodecError, EntityError, EntityHandle};

use crate::connection::ConnectionKey;

/// Errors that can occur during server operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    #[error("Connection {key} does not exist")]
    NoSuchConnection { key: ConnectionKey },

    #[error("Entity {entity} does not exist")]
    NoSuchEntity { entity: EntityHandle },

    /// Only types registered with `Protocol::add_class` can be spawned
    #[error("Type `{type_name}` is not a registered class")]
    UnregisteredClass { type_name: &'static str },

    #[error(transparent)]
    Entity(#[from] EntityError),

    /// A property accessor rejected the entity it was handed
    #[error("Failed to read property `{property}` of entity {entity}: {source}")]
    Access {
        entity: EntityHandle,
        property: String,
        source: AccessError,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}
