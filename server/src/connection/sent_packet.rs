use std::collections::HashMap;

use propnet_shared::{DiffMask, EntityHandle, EntityIndex, WireValue};

/// Everything one packet carried for one entity, kept until the packet is
/// acknowledged or superseded
pub(crate) struct SentEntity {
    /// Epoch of the replica the record was sent for
    pub epoch: u64,
    /// The entity's whole quantized vector at send time
    pub values: Vec<WireValue>,
    pub sent: DiffMask,
    /// Dirty at send time but left out for budget
    pub deferred: DiffMask,
}

#[derive(Default)]
pub(crate) struct SentPacket {
    /// Removed handles, with the epoch of the replica each one ended
    pub removals: Vec<(EntityHandle, u64)>,
    pub entities: HashMap<EntityIndex, SentEntity>,
}
