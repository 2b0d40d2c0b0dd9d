use std::sync::Arc;

use propnet_client::{Client, ClientConfig};
use propnet_server::ConnectionKey;
use propnet_shared::{Ack, Protocol};

/// A client paired with the server connection that feeds it
pub struct TestClient {
    pub key: ConnectionKey,
    pub client: Client,
    /// Acks produced but not yet delivered to the server
    pub pending_acks: Vec<Ack>,
}

impl TestClient {
    pub fn new(key: ConnectionKey, protocol: Arc<Protocol>) -> Self {
        Self {
            key,
            client: Client::new(ClientConfig::default(), protocol),
            pending_acks: Vec::new(),
        }
    }
}
