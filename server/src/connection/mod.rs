mod connection;
mod connection_key;
mod replica;
mod sent_packet;

pub use connection::Connection;
pub(crate) use connection::OutgoingUpdate;
pub use connection_key::ConnectionKey;
