use propnet_shared::{ClassId, DiffMask, EntityHandle, WireValue};

/// What one connection's client is believed to hold for one entity
pub(crate) struct Replica {
    pub handle: EntityHandle,
    /// Distinguishes this replica from earlier ones of the same handle that
    /// left scope; sent records only ever apply to their own epoch
    pub epoch: u64,
    pub class_id: ClassId,
    /// `None` until a full update has been sent (optimistic) or
    /// acknowledged (acknowledged mode)
    pub baseline: Option<Vec<WireValue>>,
    /// Properties whose client-side value is unknown, re-sent even when the
    /// baseline matches
    pub uncertain: DiffMask,
}

impl Replica {
    pub fn new(handle: EntityHandle, epoch: u64, class_id: ClassId, len: usize) -> Self {
        Self {
            handle,
            epoch,
            class_id,
            baseline: None,
            uncertain: DiffMask::new(len),
        }
    }
}
