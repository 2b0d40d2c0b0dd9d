//! # Propnet Server
//! Tracks, per connected client, which entities it can see and what it is
//! known to hold, and turns the authoritative world into minimal update
//! packets once per tick.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod shared {
    pub use propnet_shared::{
        Ack, EntityHandle, Protocol, PropertyDescriptor, PropertyTable, Tick, UpdateKind,
    };
}

mod connection;
mod delta;
mod error;
mod scope;
mod server;
mod world;

pub use connection::{Connection, ConnectionKey};
pub use error::ServerError;
pub use scope::{ScopeMut, ScopeRef};
pub use server::{BaselineMode, ReplicationConfig, Server, ServerConfig};
pub use world::{EntityRef, EntitySnapshot, ServerWorld, WorldSnapshot};
