use std::{any::Any, sync::Arc};

use log::{debug, info, warn};

use propnet_shared::{
    sequence_greater_than, try_wrapping_diff, Ack, EntityHandle, EntityIndex, PropertyValue,
    Protocol, SerialLookup, Tick, UpdateReader,
};

use crate::{
    client_config::ClientConfig,
    error::ClientError,
    events::{EntityUpdate, ReplicationEvents},
    world::{AppliedPacket, EntityMirror, EntityState},
};

type UpdateCallback = Box<dyn FnMut(&EntityUpdate) + Send>;
type RemoveCallback = Box<dyn FnMut(EntityHandle) + Send>;

/// Client can receive update packets from a Server, apply them to its
/// mirror of the Server's entities, and acknowledge them
pub struct Client {
    config: ClientConfig,
    protocol: Arc<Protocol>,
    mirror: EntityMirror,
    last_tick: Option<Tick>,
    connected: bool,
    events: ReplicationEvents,
    update_callbacks: Vec<UpdateCallback>,
    remove_callbacks: Vec<RemoveCallback>,
}

impl Client {
    /// Create a new Client
    pub fn new(config: ClientConfig, protocol: Arc<Protocol>) -> Self {
        if let Err(error) = protocol.try_check_built() {
            warn!("client created with an unusable protocol: {}", error);
        }
        Self {
            config,
            protocol,
            mirror: EntityMirror::new(),
            last_tick: None,
            connected: true,
            events: ReplicationEvents::new(),
            update_callbacks: Vec::new(),
            remove_callbacks: Vec::new(),
        }
    }

    pub fn protocol(&self) -> &Arc<Protocol> {
        &self.protocol
    }

    /// Tick of the newest packet applied so far
    pub fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    // Callbacks

    /// Called once per entity per applied packet, after all of the packet's
    /// values are in place
    pub fn on_update<F: FnMut(&EntityUpdate) + Send + 'static>(&mut self, callback: F) {
        self.update_callbacks.push(Box::new(callback));
    }

    pub fn on_remove<F: FnMut(EntityHandle) + Send + 'static>(&mut self, callback: F) {
        self.remove_callbacks.push(Box::new(callback));
    }

    /// Takes every event queued since the last call
    pub fn take_events(&mut self) -> ReplicationEvents {
        std::mem::take(&mut self.events)
    }

    // Incoming packets

    /// Parses, validates and applies one update packet. Returns the
    /// acknowledgment to send back, or `None` if the packet was older than
    /// one already applied and was dropped.
    ///
    /// A protocol violation closes the connection: the mirror is dropped
    /// and every later call returns `ClientError::Disconnected`.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<Option<Ack>, ClientError> {
        if !self.connected {
            return Err(ClientError::Disconnected);
        }

        let packet = match UpdateReader::read_packet(&self.protocol, bytes, self.max_entity_index()) {
            Ok(packet) => packet,
            Err(violation) => return Err(self.fail(violation.into())),
        };

        if let Some(last) = self.last_tick {
            if !sequence_greater_than(packet.tick, last) {
                match try_wrapping_diff(packet.tick, last) {
                    Ok(behind) => debug!(
                        "dropping update for tick {}, {} ticks behind {}",
                        packet.tick, behind, last
                    ),
                    Err(error) => debug!("dropping update for tick {}: {}", packet.tick, error),
                }
                return Ok(None);
            }
        }

        let applied = match self.mirror.apply(&self.protocol, &packet) {
            Ok(applied) => applied,
            Err(error) => return Err(self.fail(error)),
        };
        self.last_tick = Some(packet.tick);
        self.dispatch(applied);

        Ok(Some(Ack::new(packet.tick)))
    }

    fn max_entity_index(&self) -> EntityIndex {
        let addressable = self.protocol.max_entity_index();
        match self.config.max_entity_index {
            Some(max) => max.min(addressable),
            None => addressable,
        }
    }

    fn fail(&mut self, error: ClientError) -> ClientError {
        warn!("closing connection: {}", error);
        self.connected = false;
        self.mirror.clear();
        error
    }

    fn dispatch(&mut self, applied: AppliedPacket) {
        for entity in applied.removed {
            for callback in &mut self.remove_callbacks {
                callback(entity);
            }
            self.events.push_removal(entity);
        }
        for update in applied.updated {
            for callback in &mut self.update_callbacks {
                callback(&update);
            }
            self.events.push_update(update);
        }
    }

    /// Drops the mirror. Callbacks stay registered.
    pub fn disconnect(&mut self) {
        if self.connected {
            info!("disconnected with {} mirrored entities", self.mirror.len());
        }
        self.connected = false;
        self.mirror.clear();
        self.events.clear();
        self.last_tick = None;
    }

    // Mirror

    pub fn entity<T: Any>(&self, handle: EntityHandle) -> Option<&T> {
        self.mirror.get(handle)?.instance().downcast_ref::<T>()
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.mirror.handles()
    }

    pub fn entity_count(&self) -> usize {
        self.mirror.len()
    }

    pub fn entity_state(&self, handle: EntityHandle) -> EntityState {
        self.mirror.state(handle)
    }

    /// `Some(handle)` while the handle still names a mirrored instance
    pub fn resolve(&self, handle: EntityHandle) -> Option<EntityHandle> {
        self.mirror.resolve(handle)
    }

    /// Reads a property by its flattened name, e.g. `"weapon.ammo"`
    pub fn value(&self, handle: EntityHandle, name: &str) -> Result<PropertyValue, ClientError> {
        let record = self
            .mirror
            .get(handle)
            .ok_or(ClientError::NoSuchEntity { entity: handle })?;
        let class = self
            .protocol
            .class(record.class_id())
            .ok_or(ClientError::NoSuchEntity { entity: handle })?;
        let schema = class.schema();
        let index = schema
            .index_of(name)
            .ok_or_else(|| ClientError::NoSuchProperty {
                class: class.name().to_string(),
                name: name.to_string(),
            })?;
        schema
            .read(record.instance(), index)
            .map_err(|source| ClientError::Access {
                entity: handle,
                property: name.to_string(),
                source,
            })
    }
}
