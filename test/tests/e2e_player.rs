/// End-to-end: a Player replicated from server world to client mirror.
use propnet_client::{EntityState, RemoveEntityEvent, UpdateEntityEvent};
use propnet_shared::{PropertyValue, UpdateKind, UpdateReader};
use propnet_test::{
    assert_vector_within, exchange_packets, helpers::assertions::angle_distance, protocol,
    PacketFate, Player, PlayerBuilder, TestClient, TestServer,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn player_scenario() {
    init_logging();
    let mut server = TestServer::new(protocol());
    let player = server.world.spawn(
        PlayerBuilder::new()
            .origin(1000.3, 2000.7, 4095.5)
            .eye_yaw(123.45)
            .name("ranger")
            .weapon(30, 0.25)
            .build(),
    );
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);

    let mirrored = client.client.entity::<Player>(player).unwrap();
    assert_vector_within!(mirrored.base.origin, [1000.3, 2000.7, 4095.5], 2.0);
    assert!(angle_distance(mirrored.eye_yaw, 123.45) < 0.18);
    assert_eq!(mirrored.name, "ranger");
    assert_eq!(mirrored.base.health, 100);
    assert_eq!(client.client.value(player, "weapon.ammo"), Ok(PropertyValue::Int(30)));

    let mut events = client.client.take_events();
    let updates: Vec<_> = events.read::<UpdateEntityEvent>().collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].kind, UpdateKind::Full);

    // nothing changed: zero-property tick
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    let protocol = server.server.protocol();
    let packet = UpdateReader::read_packet(protocol, &sent[0], protocol.max_entity_index()).unwrap();
    assert!(packet.updates.is_empty());
    assert!(client.client.take_events().is_empty());
}

#[test]
fn one_notification_per_entity_per_packet() {
    let mut server = TestServer::new(protocol());
    let players: Vec<_> = (0..3)
        .map(|_| server.world.spawn(PlayerBuilder::new().build()))
        .collect();
    let key = server.connect_with(&players);
    let mut client = TestClient::new(key, server.server.protocol().clone());
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    client.client.take_events();

    let state = server.world.get_mut::<Player>(players[1]).unwrap();
    state.eye_yaw = 200.0;
    state.base.origin = [5.0, 6.0, 7.0];
    state.weapon.heat = 1.0;
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);

    let updates: Vec<_> = client.client.take_events().read::<UpdateEntityEvent>().collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].entity, players[1]);
    assert_eq!(updates[0].kind, UpdateKind::Delta);
    assert_eq!(updates[0].changed.len(), 3);
    assert_eq!(client.client.entity_state(players[1]), EntityState::Updated);
}

#[test]
fn scope_exit_removes_once_and_reentry_is_full() {
    let mut server = TestServer::new(protocol());
    let player = server.world.spawn(PlayerBuilder::new().build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    client.client.take_events();

    server.server.scope_mut(key).exclude(player);
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    let protocol = server.server.protocol().clone();
    let packet = UpdateReader::read_packet(&protocol, &sent[0], protocol.max_entity_index()).unwrap();
    assert_eq!(packet.removals, vec![player]);
    assert_eq!(client.client.entity_state(player), EntityState::Destroyed);
    let removed: Vec<_> = client.client.take_events().read::<RemoveEntityEvent>().collect();
    assert_eq!(removed, vec![player]);

    // removal is sent once
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    let packet = UpdateReader::read_packet(&protocol, &sent[0], protocol.max_entity_index()).unwrap();
    assert!(packet.removals.is_empty());

    server.server.scope_mut(key).include(player);
    let sent = exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    let packet = UpdateReader::read_packet(&protocol, &sent[0], protocol.max_entity_index()).unwrap();
    assert_eq!(packet.updates[0].kind, UpdateKind::Full);
    assert!(client.client.entity::<Player>(player).is_some());
}

#[test]
fn despawn_reaches_every_client_and_disconnect_is_isolated() {
    let mut server = TestServer::new(protocol());
    let player = server.world.spawn(PlayerBuilder::new().build());
    let first_key = server.connect_with(&[player]);
    let second_key = server.connect_with(&[player]);
    let protocol = server.server.protocol().clone();
    let mut first = TestClient::new(first_key, protocol.clone());
    let mut second = TestClient::new(second_key, protocol);

    exchange_packets(&mut server, &mut [&mut first, &mut second], PacketFate::Delivered);
    assert!(first.client.entity::<Player>(player).is_some());
    assert!(second.client.entity::<Player>(player).is_some());

    server.server.disconnect(first_key).unwrap();
    first.client.disconnect();
    assert_eq!(first.client.entity_count(), 0);

    server.world.get_mut::<Player>(player).unwrap().base.health = -5;
    exchange_packets(&mut server, &mut [&mut second], PacketFate::Delivered);
    assert_eq!(second.client.entity::<Player>(player).unwrap().base.health, -5);

    server.world.despawn(player).unwrap();
    exchange_packets(&mut server, &mut [&mut second], PacketFate::Delivered);
    assert_eq!(second.client.entity_count(), 0);
    assert!(server.server.scope(second_key).entities().next().is_none());
}
