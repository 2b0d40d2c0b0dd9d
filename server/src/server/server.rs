use std::{collections::HashMap, sync::Arc};

use log::{debug, info, warn};

use propnet_shared::{Ack, Protocol, Tick};

use crate::{
    connection::{Connection, ConnectionKey, OutgoingUpdate},
    error::ServerError,
    scope::{ScopeMut, ScopeRef},
    world::{ServerWorld, WorldSnapshot},
};

use super::{ReplicationConfig, ServerConfig};

/// Owns every connection's scope and baseline and produces each tick's
/// update packets
pub struct Server {
    config: ServerConfig,
    protocol: Arc<Protocol>,
    connections: HashMap<ConnectionKey, Connection>,
    next_key: u64,
    tick: Tick,
}

impl Server {
    pub fn new(config: ServerConfig, protocol: Arc<Protocol>) -> Self {
        if let Err(error) = protocol.try_check_built() {
            warn!("server created with an unusable protocol: {}", error);
        }
        Self {
            config,
            protocol,
            connections: HashMap::new(),
            next_key: 0,
            tick: 0,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn protocol(&self) -> &Arc<Protocol> {
        &self.protocol
    }

    /// Tick the next batch of packets will be stamped with
    pub fn tick(&self) -> Tick {
        self.tick
    }

    // Connections

    pub fn connect(&mut self) -> ConnectionKey {
        let key = ConnectionKey::new(self.next_key);
        self.next_key += 1;
        self.connections.insert(key, Connection::new(key));
        info!("connection {} opened", key);
        key
    }

    /// Drops the connection and its baselines; other connections are
    /// unaffected
    pub fn disconnect(&mut self, key: ConnectionKey) -> Result<(), ServerError> {
        let connection = self
            .connections
            .remove(&key)
            .ok_or(ServerError::NoSuchConnection { key })?;
        connection.log_disconnect();
        Ok(())
    }

    pub fn connection(&self, key: ConnectionKey) -> Option<&Connection> {
        self.connections.get(&key)
    }

    pub fn connection_keys(&self) -> impl Iterator<Item = ConnectionKey> + '_ {
        self.connections.keys().copied()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // Scopes

    /// # Panics
    ///
    /// Panics if the connection does not exist.
    /// Consider using `try_scope` for non-panicking error handling.
    pub fn scope(&self, key: ConnectionKey) -> ScopeRef<'_> {
        match self.try_scope(key) {
            Ok(scope) => scope,
            Err(error) => panic!("{}", error),
        }
    }

    pub fn try_scope(&self, key: ConnectionKey) -> Result<ScopeRef<'_>, ServerError> {
        self.connections
            .get(&key)
            .map(ScopeRef::new)
            .ok_or(ServerError::NoSuchConnection { key })
    }

    /// # Panics
    ///
    /// Panics if the connection does not exist.
    /// Consider using `try_scope_mut` for non-panicking error handling.
    pub fn scope_mut(&mut self, key: ConnectionKey) -> ScopeMut<'_> {
        match self.try_scope_mut(key) {
            Ok(scope) => scope,
            Err(error) => panic!("{}", error),
        }
    }

    pub fn try_scope_mut(&mut self, key: ConnectionKey) -> Result<ScopeMut<'_>, ServerError> {
        self.connections
            .get_mut(&key)
            .map(ScopeMut::new)
            .ok_or(ServerError::NoSuchConnection { key })
    }

    // Acknowledgments

    /// Returns false if the acknowledgment was stale and ignored
    pub fn receive_ack(&mut self, key: ConnectionKey, ack: Ack) -> Result<bool, ServerError> {
        let mode = self.config.replication.baseline_mode;
        let connection = self
            .connections
            .get_mut(&key)
            .ok_or(ServerError::NoSuchConnection { key })?;
        Ok(connection.receive_ack(ack, mode))
    }

    // Updates

    /// Builds one update packet per connection from the world's current
    /// state, then advances the tick. Packets come back sorted by key.
    /// If any connection's packet fails to build, no connection's state
    /// moves and the tick is not advanced.
    pub fn send_updates(
        &mut self,
        world: &ServerWorld,
    ) -> Result<Vec<(ConnectionKey, Vec<u8>)>, ServerError> {
        let snapshot = world.snapshot()?;
        let tick = self.tick;
        let protocol: &Protocol = &self.protocol;
        let config = &self.config.replication;

        let results = for_each_connection(&self.connections, |connection| {
            build_connection_update(connection, protocol, &snapshot, tick, config)
        });

        // a tick is committed for every connection or for none
        let mut built = Vec::with_capacity(results.len());
        for result in results {
            built.push(result?);
        }
        let mut packets = Vec::with_capacity(built.len());
        for (key, update, bytes) in built {
            if let Some(connection) = self.connections.get_mut(&key) {
                connection.commit(update, config.baseline_mode);
            }
            packets.push((key, bytes));
        }
        packets.sort_by_key(|(key, _)| *key);

        self.tick = self.tick.wrapping_add(1);
        Ok(packets)
    }
}

fn build_connection_update<'s>(
    connection: &Connection,
    protocol: &Protocol,
    snapshot: &'s WorldSnapshot,
    tick: Tick,
    config: &ReplicationConfig,
) -> Result<(ConnectionKey, OutgoingUpdate<'s>, Vec<u8>), ServerError> {
    let update = connection.build_update(protocol, snapshot, tick, config)?;
    let bytes = connection.write_update(protocol, &update)?;
    debug!(
        "connection {}: tick {} carries {} removals and {} entity records in {} bytes",
        connection.key(),
        tick,
        update.removal_count(),
        update.update_count(),
        bytes.len()
    );
    Ok((connection.key(), update, bytes))
}

cfg_if! {
    if #[cfg(feature = "parallel")] {
        use rayon::prelude::*;

        // connections, world and schemas are all read-only while packets are built
        fn for_each_connection<R, F>(connections: &HashMap<ConnectionKey, Connection>, f: F) -> Vec<R>
        where
            R: Send,
            F: Fn(&Connection) -> R + Send + Sync,
        {
            connections
                .par_iter()
                .map(|(_, connection)| f(connection))
                .collect()
        }
    } else {
        fn for_each_connection<R, F>(connections: &HashMap<ConnectionKey, Connection>, f: F) -> Vec<R>
        where
            F: Fn(&Connection) -> R,
        {
            connections
                .iter()
                .map(|(_, connection)| f(connection))
                .collect()
        }
    }
}
