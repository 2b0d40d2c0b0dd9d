use propnet_shared::EntityIndex;

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    /// Highest entity index this client accepts in an update packet. `None`
    /// accepts every index the protocol can address.
    pub max_entity_index: Option<EntityIndex>,
}
