use propnet_shared::{
    ClassId, DiffMask, EntityHandle, PendingDelta, PropertyIndex, Tick, UpdateKind, WireValue,
};

/// An in-scope entity whose client state is behind: either it has never
/// been fully sent, or some properties are dirty.
pub(crate) struct Candidate<'s> {
    pub handle: EntityHandle,
    pub class_id: ClassId,
    pub kind: UpdateKind,
    pub values: &'s [WireValue],
    pub dirty: DiffMask,
}

/// What the budget let through for one entity this tick
pub(crate) struct Selection<'s> {
    pub handle: EntityHandle,
    pub class_id: ClassId,
    pub kind: UpdateKind,
    pub values: &'s [WireValue],
    pub dirty: DiffMask,
    /// Strictly increasing
    pub chosen: Vec<PropertyIndex>,
}

impl<'s> Selection<'s> {
    pub fn from_candidate(candidate: Candidate<'s>) -> Self {
        Self {
            handle: candidate.handle,
            class_id: candidate.class_id,
            kind: candidate.kind,
            values: candidate.values,
            dirty: candidate.dirty,
            chosen: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }

    pub fn to_delta(&self, tick: Tick) -> PendingDelta {
        Self::delta_with(self, tick, &self.chosen)
    }

    /// The record this selection would produce with `chosen` instead
    pub fn delta_with(&self, tick: Tick, chosen: &[PropertyIndex]) -> PendingDelta {
        PendingDelta {
            tick,
            entity: self.handle,
            class_id: self.class_id,
            kind: self.kind,
            changed: chosen.to_vec(),
            values: chosen
                .iter()
                .filter_map(|index| self.values.get(usize::from(*index)).cloned())
                .collect(),
        }
    }

    pub fn sent_mask(&self) -> DiffMask {
        let mut mask = DiffMask::new(self.values.len());
        for index in &self.chosen {
            mask.set_bit(*index, true);
        }
        mask
    }

    /// Dirty properties this tick's packet leaves out
    pub fn deferred_mask(&self) -> DiffMask {
        let mut mask = self.dirty.clone();
        mask.nand(&self.sent_mask());
        mask
    }
}
