pub mod test_protocol;

pub use helpers::*;
pub use test_protocol::{protocol, BaseEntity, Player, Weapon};
