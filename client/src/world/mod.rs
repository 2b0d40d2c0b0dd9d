mod entity_record;
mod mirror;

pub use entity_record::EntityState;
pub(crate) use mirror::{AppliedPacket, EntityMirror};
