use std::default::Default;

use propnet_shared::MTU_SIZE_BITS;

/// How a connection's baseline moves forward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BaselineMode {
    /// The baseline becomes whatever was last sent. Needs a transport that
    /// delivers every packet in order: the client drops a packet older than
    /// one it already applied, and nothing it carried is sent again.
    #[default]
    Optimistic,
    /// Deltas are computed against the last state the client acknowledged;
    /// anything unacknowledged is sent again.
    Acknowledged,
}

/// Contains Config properties which will be used to build update packets
#[derive(Clone, Debug)]
pub struct ReplicationConfig {
    pub baseline_mode: BaselineMode,
    /// Bit budget of a single update packet. Removals and "changes often"
    /// properties are always sent, even past this limit.
    pub max_update_bits: u32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            baseline_mode: BaselineMode::default(),
            max_update_bits: MTU_SIZE_BITS,
        }
    }
}

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Used to configure baselines and the per-packet budget
    pub replication: ReplicationConfig,
}
