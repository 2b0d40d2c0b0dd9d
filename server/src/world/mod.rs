mod server_world;
mod snapshot;

pub use server_world::{EntityRef, ServerWorld};
pub use snapshot::{EntitySnapshot, WorldSnapshot};
