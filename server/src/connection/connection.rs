use std::collections::{BTreeMap, HashMap};

use log::{debug, info};

use propnet_shared::{
    sequence_greater_than, Ack, DiffMask, EntityHandle, EntityIndex, PropertyIndex, Protocol,
    SequenceList, Tick, UpdateKind, UpdateWriter, WireValue,
};

use crate::{
    delta::{select_updates, Candidate, Selection},
    error::ServerError,
    server::{BaselineMode, ReplicationConfig},
    world::{EntitySnapshot, WorldSnapshot},
};

use super::{
    replica::Replica,
    sent_packet::{SentEntity, SentPacket},
    ConnectionKey,
};

/// Packets kept waiting for an acknowledgment before the oldest is given up
/// on and its properties are marked uncertain
const MAX_OUTSTANDING_PACKETS: usize = 64;

/// One client's view of the world: what it may see, and what it is known to
/// hold.
pub struct Connection {
    key: ConnectionKey,
    scope: BTreeMap<EntityIndex, EntityHandle>,
    replicas: BTreeMap<EntityIndex, Replica>,
    // removal to deliver, keyed to the epoch of the replica it ends
    pending_removals: BTreeMap<EntityHandle, u64>,
    sent_packets: SequenceList<SentPacket>,
    last_acked: Option<Tick>,
    next_epoch: u64,
}

/// A computed but not yet committed packet
pub(crate) struct OutgoingUpdate<'s> {
    tick: Tick,
    removals: Vec<(EntityHandle, u64)>,
    departed: Vec<EntityHandle>,
    selections: Vec<Selection<'s>>,
}

impl Connection {
    pub fn new(key: ConnectionKey) -> Self {
        Self {
            key,
            scope: BTreeMap::new(),
            replicas: BTreeMap::new(),
            pending_removals: BTreeMap::new(),
            sent_packets: SequenceList::new(),
            last_acked: None,
            next_epoch: 0,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        self.key
    }

    pub fn last_acked(&self) -> Option<Tick> {
        self.last_acked
    }

    // Scope

    pub fn has(&self, handle: EntityHandle) -> bool {
        self.scope.get(&handle.index()) == Some(&handle)
    }

    /// Entities in scope, in index order
    pub fn scope(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.scope.values().copied()
    }

    pub fn include(&mut self, handle: EntityHandle) {
        if let Some(previous) = self.scope.get(&handle.index()).copied() {
            if previous == handle {
                return;
            }
            self.exclude(previous);
        }
        // a removal not yet delivered is superseded by the full update
        self.pending_removals.remove(&handle);
        self.scope.insert(handle.index(), handle);
    }

    pub fn exclude(&mut self, handle: EntityHandle) {
        if self.scope.get(&handle.index()) != Some(&handle) {
            return;
        }
        self.scope.remove(&handle.index());
        self.forget(handle);
    }

    pub fn clear_scope(&mut self) {
        let handles: Vec<EntityHandle> = self.scope.values().copied().collect();
        for handle in handles {
            self.exclude(handle);
        }
    }

    /// Drops the client-side replica of `handle`, scheduling a removal if
    /// the client may have it.
    fn forget(&mut self, handle: EntityHandle) {
        let known = self
            .replicas
            .get(&handle.index())
            .is_some_and(|replica| replica.handle == handle);
        if !known {
            return;
        }
        if let Some(replica) = self.replicas.remove(&handle.index()) {
            self.pending_removals.insert(handle, replica.epoch);
            debug!("connection {}: entity {} leaves scope", self.key, handle);
        }
    }

    // Outgoing

    /// Works out this tick's packet without touching any state, so the
    /// same baseline and snapshot always give the same packet.
    pub(crate) fn build_update<'s>(
        &self,
        protocol: &Protocol,
        snapshot: &'s WorldSnapshot,
        tick: Tick,
        config: &ReplicationConfig,
    ) -> Result<OutgoingUpdate<'s>, ServerError> {
        let mut removals = self.pending_removals.clone();
        let mut departed = Vec::new();
        let mut candidates = Vec::new();

        for handle in self.scope.values() {
            let Some(entity) = snapshot.get(*handle) else {
                // despawned, or the slot already holds someone else
                departed.push(*handle);
                if let Some(replica) = self
                    .replicas
                    .get(&handle.index())
                    .filter(|replica| replica.handle == *handle)
                {
                    removals.insert(*handle, replica.epoch);
                }
                continue;
            };

            let replica = self
                .replicas
                .get(&handle.index())
                .filter(|replica| replica.handle == *handle && replica.class_id == entity.class_id());
            match replica.and_then(|replica| replica.baseline.as_ref().map(|baseline| (replica, baseline))) {
                Some((replica, baseline)) => {
                    let dirty = self.dirty_mask(entity, replica, baseline);
                    if dirty.is_clear() {
                        continue;
                    }
                    candidates.push(Candidate {
                        handle: *handle,
                        class_id: entity.class_id(),
                        kind: UpdateKind::Delta,
                        values: entity.values(),
                        dirty,
                    });
                }
                None => candidates.push(Candidate {
                    handle: *handle,
                    class_id: entity.class_id(),
                    kind: UpdateKind::Full,
                    values: entity.values(),
                    dirty: DiffMask::full(entity.values().len()),
                }),
            }
        }

        let removals: Vec<(EntityHandle, u64)> = removals.into_iter().collect();
        let removal_bits: u32 = removals
            .iter()
            .map(|(handle, _)| UpdateWriter::removal_bit_length(*handle))
            .sum();
        let budget = config
            .max_update_bits
            .saturating_sub(UpdateWriter::packet_overhead_bits() + removal_bits);
        let selections = select_updates(protocol, candidates, budget)?;

        Ok(OutgoingUpdate {
            tick,
            removals,
            departed,
            selections,
        })
    }

    fn dirty_mask(
        &self,
        entity: &EntitySnapshot,
        replica: &Replica,
        baseline: &[WireValue],
    ) -> DiffMask {
        let values = entity.values();
        let mut dirty = replica.uncertain.clone();
        for (index, (current, known)) in values.iter().zip(baseline).enumerate() {
            if current != known {
                dirty.set_bit(index as PropertyIndex, true);
            }
        }

        // values sent since the baseline may have arrived; if the entity
        // has since changed back they are wrong on the client
        for (_, packet) in self.sent_packets.iter() {
            let Some(sent) = packet.entities.get(&entity.handle().index()) else {
                continue;
            };
            if sent.epoch != replica.epoch {
                continue;
            }
            for index in sent.sent.iter_set() {
                let position = usize::from(index);
                if sent.values.get(position) != values.get(position) {
                    dirty.set_bit(index, true);
                }
            }
        }
        dirty
    }

    pub(crate) fn write_update(
        &self,
        protocol: &Protocol,
        update: &OutgoingUpdate,
    ) -> Result<Vec<u8>, ServerError> {
        let deltas: Vec<_> = update
            .selections
            .iter()
            .map(|selection| selection.to_delta(update.tick))
            .collect();
        let removals: Vec<EntityHandle> = update.removals.iter().map(|(handle, _)| *handle).collect();
        Ok(UpdateWriter::write_packet(
            protocol,
            update.tick,
            &removals,
            &deltas,
        )?)
    }

    /// Records that `update` went out
    pub(crate) fn commit(&mut self, update: OutgoingUpdate, mode: BaselineMode) {
        for handle in &update.departed {
            if self.scope.get(&handle.index()) == Some(handle) {
                self.scope.remove(&handle.index());
            }
            if self
                .replicas
                .get(&handle.index())
                .is_some_and(|replica| replica.handle == *handle)
            {
                self.replicas.remove(&handle.index());
            }
        }

        let mut packet = SentPacket {
            removals: update.removals.clone(),
            entities: HashMap::new(),
        };
        match mode {
            BaselineMode::Optimistic => self.pending_removals.clear(),
            BaselineMode::Acknowledged => self.pending_removals.extend(update.removals.iter().copied()),
        }

        for selection in &update.selections {
            let index = selection.handle.index();
            let stale = self
                .replicas
                .get(&index)
                .is_some_and(|replica| replica.handle != selection.handle);
            if stale {
                self.replicas.remove(&index);
            }
            if !self.replicas.contains_key(&index) {
                let replica = Replica::new(
                    selection.handle,
                    self.next_epoch,
                    selection.class_id,
                    selection.values.len(),
                );
                self.next_epoch += 1;
                self.replicas.insert(index, replica);
            }
            let Some(replica) = self.replicas.get_mut(&index) else {
                continue;
            };

            match mode {
                BaselineMode::Optimistic => match selection.kind {
                    UpdateKind::Full => replica.baseline = Some(selection.values.to_vec()),
                    UpdateKind::Delta => {
                        if let Some(baseline) = replica.baseline.as_mut() {
                            for index in &selection.chosen {
                                let position = usize::from(*index);
                                if let (Some(known), Some(current)) =
                                    (baseline.get_mut(position), selection.values.get(position))
                                {
                                    *known = current.clone();
                                }
                            }
                        }
                    }
                },
                BaselineMode::Acknowledged => {
                    packet.entities.insert(
                        index,
                        SentEntity {
                            epoch: replica.epoch,
                            values: selection.values.to_vec(),
                            sent: selection.sent_mask(),
                            deferred: selection.deferred_mask(),
                        },
                    );
                }
            }
        }

        if mode == BaselineMode::Acknowledged {
            if let Err(error) = self.sent_packets.try_push_back(update.tick, packet) {
                debug!("connection {}: not recording packet: {}", self.key, error);
            }
            while self.sent_packets.len() > MAX_OUTSTANDING_PACKETS {
                if let Some((tick, packet)) = self.sent_packets.pop_front() {
                    debug!(
                        "connection {}: giving up on acknowledgment of tick {}",
                        self.key, tick
                    );
                    self.mark_uncertain(packet);
                }
            }
        }
    }

    // Incoming

    /// Promotes what the acknowledged packet carried to the baseline.
    /// Returns false for stale acknowledgments, which change nothing.
    pub fn receive_ack(&mut self, ack: Ack, mode: BaselineMode) -> bool {
        if let Some(last) = self.last_acked {
            if !sequence_greater_than(ack.tick, last) {
                debug!(
                    "connection {}: ignoring stale ack for tick {} (last acked {})",
                    self.key, ack.tick, last
                );
                return false;
            }
        }
        self.last_acked = Some(ack.tick);

        if mode == BaselineMode::Optimistic {
            return true;
        }

        while let Some((tick, _)) = self.sent_packets.front() {
            if sequence_greater_than(*tick, ack.tick) {
                break;
            }
            let Some((tick, packet)) = self.sent_packets.pop_front() else {
                break;
            };
            if tick == ack.tick {
                self.promote(packet);
            } else {
                // the client moved past it; whether it arrived is unknown
                self.mark_uncertain(packet);
            }
        }
        true
    }

    fn promote(&mut self, packet: SentPacket) {
        for (handle, epoch) in packet.removals {
            // a later exit of the same handle still needs its own removal
            if self.pending_removals.get(&handle) == Some(&epoch) {
                self.pending_removals.remove(&handle);
            }
        }
        for (index, sent) in packet.entities {
            let Some(replica) = self.replicas.get_mut(&index) else {
                continue;
            };
            if replica.epoch != sent.epoch {
                continue;
            }
            replica.baseline = Some(sent.values);
            replica.uncertain = sent.deferred;
        }
    }

    fn mark_uncertain(&mut self, packet: SentPacket) {
        for (index, sent) in packet.entities {
            let Some(replica) = self.replicas.get_mut(&index) else {
                continue;
            };
            if replica.epoch == sent.epoch && replica.baseline.is_some() {
                replica.uncertain.or(&sent.sent);
            }
        }
    }

    /// Number of packets awaiting acknowledgment
    pub fn outstanding_packets(&self) -> usize {
        self.sent_packets.len()
    }

    pub(crate) fn log_disconnect(&self) {
        info!(
            "connection {} closed with {} replicated entities",
            self.key,
            self.replicas.len()
        );
    }
}

impl OutgoingUpdate<'_> {
    pub fn removal_count(&self) -> usize {
        self.removals.len()
    }

    pub fn update_count(&self) -> usize {
        self.selections.len()
    }
}
