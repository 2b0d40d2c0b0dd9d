//! # Propnet Client
//! Receives the server's update stream, mirrors every in-scope entity into
//! its registered Rust type and notifies the game once per entity per
//! packet.

#![deny(trivial_casts, trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod shared {
    pub use propnet_shared::{
        Ack, EntityHandle, PropertyValue, Protocol, ProtocolViolation, Tick, UpdateKind,
    };
}

mod client;
mod client_config;
mod error;
mod events;
mod world;

pub use client::Client;
pub use client_config::ClientConfig;
pub use error::ClientError;
pub use events::{
    EntityUpdate, RemoveEntityEvent, ReplicationEvent, ReplicationEvents, UpdateEntityEvent,
};
pub use world::EntityState;
