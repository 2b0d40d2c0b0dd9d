/// Server-side delta behavior observed on the wire: minimal deltas,
/// complete full updates, budgeting and both baseline modes.
use propnet_server::{ReplicationConfig, ServerConfig};
use propnet_shared::{Ack, PropertyIndex, UpdateKind, UpdatePacket, UpdateReader};
use propnet_test::{
    exchange_packets, exchange_packets_n_times, protocol, PacketFate, Player, PlayerBuilder,
    TestClient, TestServer,
};

fn read(server: &TestServer, bytes: &[u8]) -> UpdatePacket {
    let protocol = server.server.protocol();
    UpdateReader::read_packet(protocol, bytes, protocol.max_entity_index()).unwrap()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn unchanged_entity_produces_no_record() {
    init_logging();
    let mut server = TestServer::new(protocol());
    let player = server.world.spawn(PlayerBuilder::new().origin(10.0, 20.0, 30.0).build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    let ticks = exchange_packets_n_times(&mut server, &mut [&mut client], 3);
    assert_eq!(read(&server, &ticks[0][0]).updates.len(), 1);
    for tick in &ticks[1..] {
        let packet = read(&server, &tick[0]);
        assert!(packet.updates.is_empty());
        assert!(packet.removals.is_empty());
    }
}

#[test]
fn full_update_lists_every_property_once_in_order() {
    let mut server = TestServer::new(protocol());
    let player = server.world.spawn(PlayerBuilder::new().name("ada").weapon(12, 0.5).build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    let packet = read(&server, &sent[0]);
    let update = &packet.updates[0];
    let schema_len = server.server.protocol().class_of::<Player>().unwrap().schema().len();

    assert_eq!(update.kind, UpdateKind::Full);
    assert_eq!(update.changed, (0..schema_len as PropertyIndex).collect::<Vec<_>>());
    assert_eq!(update.values.len(), schema_len);
}

#[test]
fn only_changed_properties_are_sent() {
    let mut server = TestServer::new(protocol());
    let player = server.world.spawn(PlayerBuilder::new().build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);

    server.world.get_mut::<Player>(player).unwrap().weapon.ammo = 7;
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    let packet = read(&server, &sent[0]);

    let schema = server.server.protocol().class_of::<Player>().unwrap().schema();
    assert_eq!(packet.updates[0].kind, UpdateKind::Delta);
    assert_eq!(packet.updates[0].changed, vec![schema.index_of("weapon.ammo").unwrap()]);
}

#[test]
fn sub_bucket_changes_are_not_sent() {
    let mut server = TestServer::new(protocol());
    let player = server.world.spawn(PlayerBuilder::new().origin(100.0, 100.0, 100.0).build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);

    // far below one 2-unit origin step
    server.world.get_mut::<Player>(player).unwrap().base.origin[0] += 0.01;
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    assert!(read(&server, &sent[0]).updates.is_empty());
}

#[test]
fn changes_often_properties_are_never_starved() {
    init_logging();
    let config = ServerConfig {
        replication: ReplicationConfig {
            max_update_bits: 600,
            ..Default::default()
        },
    };
    let mut server = TestServer::with_config(protocol(), config);
    let players: Vec<_> = (0..8)
        .map(|_| server.world.spawn(PlayerBuilder::new().build()))
        .collect();
    let key = server.connect_with(&players);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    // full updates trickle in under the budget
    exchange_packets_n_times(&mut server, &mut [&mut client], 8);
    assert_eq!(client.client.entity_count(), players.len());

    for (position, player) in players.iter().enumerate() {
        let state = server.world.get_mut::<Player>(*player).unwrap();
        state.eye_yaw = 10.0 * (position + 1) as f32;
        state.name = "a name long enough to fill the".to_string();
    }

    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    let packet = read(&server, &sent[0]);
    let eye_yaw = server
        .server
        .protocol()
        .class_of::<Player>()
        .unwrap()
        .schema()
        .index_of("eyeYaw")
        .unwrap();
    assert_eq!(packet.updates.len(), players.len());
    for update in &packet.updates {
        assert!(update.changed.contains(&eye_yaw));
    }

    // the deferred names arrive on later ticks
    exchange_packets_n_times(&mut server, &mut [&mut client], 12);
    for player in &players {
        assert_eq!(
            client.client.entity::<Player>(*player).unwrap().name,
            "a name long enough to fill the"
        );
    }
}

#[test]
fn acknowledged_mode_resends_until_acked() {
    let mut server = TestServer::acknowledged(protocol());
    let player = server.world.spawn(PlayerBuilder::new().build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    // acks lost: the full update keeps coming
    for _ in 0..3 {
        let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Dropped);
        let packet = read(&server, &sent[0]);
        assert_eq!(packet.updates.len(), 1);
    }

    // the newest ack lands and everything before it is settled
    let latest = *client.pending_acks.last().unwrap();
    assert_eq!(server.server.receive_ack(key, latest), Ok(true));
    client.pending_acks.clear();
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    assert!(read(&server, &sent[0]).updates.is_empty());
}

#[test]
fn acknowledged_mode_resends_a_change_whose_packet_was_lost() {
    let mut server = TestServer::acknowledged(protocol());
    let player = server.world.spawn(PlayerBuilder::new().build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);

    server.world.get_mut::<Player>(player).unwrap().base.health = 40;
    // built and sent, but never reaches the client
    let lost = server.server.send_updates(&server.world).unwrap();
    assert_eq!(read(&server, &lost[0].1).updates.len(), 1);

    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    let packet = read(&server, &sent[0]);
    assert_eq!(packet.updates.len(), 1);
    assert_eq!(client.client.entity::<Player>(player).unwrap().base.health, 40);
}

#[test]
fn acknowledged_reentry_ignores_acks_from_before_the_exit() {
    init_logging();
    let mut server = TestServer::acknowledged(protocol());
    let player = server.world.spawn(PlayerBuilder::new().weapon(3, 0.0).build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    // tick 0: full update reaches the client, its ack is held back
    let packets = server.server.send_updates(&server.world).unwrap();
    let entered = client.client.receive(&packets[0].1).unwrap().unwrap();
    assert!(client.client.entity::<Player>(player).is_some());

    // tick 1: the removal reaches the client, its ack is held back too
    server.server.scope_mut(key).exclude(player);
    let packets = server.server.send_updates(&server.world).unwrap();
    assert_eq!(read(&server, &packets[0].1).removals, vec![player]);
    let left = client.client.receive(&packets[0].1).unwrap().unwrap();
    assert!(client.client.entity::<Player>(player).is_none());

    // tick 2: back in scope, but the full update is lost
    server.server.scope_mut(key).include(player);
    let lost = server.server.send_updates(&server.world).unwrap();
    assert_eq!(read(&server, &lost[0].1).updates[0].kind, UpdateKind::Full);

    // acks from before the exit arrive late
    assert_eq!(server.server.receive_ack(key, entered), Ok(true));
    assert_eq!(server.server.receive_ack(key, left), Ok(true));

    server.world.get_mut::<Player>(player).unwrap().weapon.ammo = 9;
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    assert_eq!(read(&server, &sent[0]).updates[0].kind, UpdateKind::Full);
    assert_eq!(client.client.entity::<Player>(player).unwrap().weapon.ammo, 9);
}

#[test]
fn full_update_larger_than_the_budget_still_arrives() {
    init_logging();
    let config = ServerConfig {
        replication: ReplicationConfig {
            max_update_bits: 64,
            ..Default::default()
        },
    };
    let mut server = TestServer::with_config(protocol(), config);
    let first = server.world.spawn(PlayerBuilder::new().name("first").build());
    let second = server.world.spawn(PlayerBuilder::new().name("second").build());
    let key = server.connect_with(&[first, second]);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    // one oversized record per packet
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    assert_eq!(read(&server, &sent[0]).updates.len(), 1);
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);

    assert_eq!(client.client.entity::<Player>(first).unwrap().name, "first");
    assert_eq!(client.client.entity::<Player>(second).unwrap().name, "second");
}

#[test]
fn acknowledged_mode_survives_reordered_packets() {
    let mut server = TestServer::acknowledged(protocol());
    let player = server.world.spawn(PlayerBuilder::new().build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);

    server.world.get_mut::<Player>(player).unwrap().base.health = 55;
    let earlier = server.server.send_updates(&server.world).unwrap();
    let later = server.server.send_updates(&server.world).unwrap();

    // the later packet overtakes the earlier one, which is then dropped
    let ack = client.client.receive(&later[0].1).unwrap().unwrap();
    assert_eq!(client.client.receive(&earlier[0].1), Ok(None));
    assert_eq!(server.server.receive_ack(key, ack), Ok(true));

    assert_eq!(client.client.entity::<Player>(player).unwrap().base.health, 55);
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    assert!(read(&server, &sent[0]).updates.is_empty());
}

#[test]
fn stale_acks_are_ignored() {
    let mut server = TestServer::acknowledged(protocol());
    let player = server.world.spawn(PlayerBuilder::new().build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    exchange_packets_n_times(&mut server, &mut [&mut client], 3);
    assert_eq!(server.server.connection(key).unwrap().last_acked(), Some(2));

    assert_eq!(server.server.receive_ack(key, Ack::new(1)), Ok(false));
    assert_eq!(server.server.receive_ack(key, Ack::new(2)), Ok(false));
    assert_eq!(server.server.connection(key).unwrap().last_acked(), Some(2));
}

#[test]
fn recomputing_a_tick_is_idempotent() {
    let build = || {
        let mut server = TestServer::new(protocol());
        let player = server
            .world
            .spawn(PlayerBuilder::new().origin(1.0, 2.0, 3.0).eye_yaw(45.0).build());
        server.connect_with(&[player]);
        server.server.send_updates(&server.world).unwrap()
    };
    assert_eq!(build(), build());
}
