/// Entity handle properties across destruction and slot reuse.
use propnet_client::EntityState;
use propnet_shared::{codec::decode_handle, codec::write_handle, BitReader, BitWriter};
use propnet_test::{
    exchange_packets, protocol, BaseEntity, PacketFate, Player, PlayerBuilder, TestClient,
    TestServer,
};

#[test]
fn handle_to_reused_slot_decodes_to_invalid() {
    let mut server = TestServer::new(protocol());
    let bases: Vec<_> = (0..6)
        .map(|_| server.world.spawn(BaseEntity::default()))
        .collect();

    // take slot 5 to serial 2
    let mut slot_five = bases[5];
    for _ in 0..2 {
        server.world.despawn(slot_five).unwrap();
        slot_five = server.world.spawn(BaseEntity::default());
    }
    assert_eq!((slot_five.index(), slot_five.serial()), (5, 2));

    let index_bits = server.server.protocol().entity_index_bits();
    let mut writer = BitWriter::new();
    write_handle(&mut writer, Some(slot_five), index_bits);
    let bytes = writer.to_bytes();

    server.world.despawn(slot_five).unwrap();
    let replacement = server.world.spawn(BaseEntity::default());
    assert_eq!((replacement.index(), replacement.serial()), (5, 3));

    let mut reader = BitReader::new(&bytes);
    assert_eq!(decode_handle(&mut reader, index_bits, &server.world), Ok(None));
}

#[test]
fn mirrored_reference_goes_invalid_when_its_target_is_destroyed() {
    let mut server = TestServer::new(protocol());
    let target = server.world.spawn(BaseEntity::default());
    let player = server.world.spawn(PlayerBuilder::new().owner(target).build());
    let key = server.connect_with(&[target, player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    assert_eq!(client.client.entity::<Player>(player).unwrap().base.owner, Some(target));

    // the slot is reused by an entity this client can't see
    server.world.despawn(target).unwrap();
    let newcomer = server.world.spawn(BaseEntity::default());
    assert_eq!(newcomer.index(), target.index());
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);

    assert_eq!(client.client.entity_state(target), EntityState::Destroyed);
    assert_eq!(client.client.resolve(target), None);
    assert_eq!(client.client.entity::<Player>(player).unwrap().base.owner, None);
}

#[test]
fn reference_resolves_once_the_target_enters_scope() {
    let mut server = TestServer::new(protocol());
    let target = server.world.spawn(BaseEntity::default());
    let player = server.world.spawn(PlayerBuilder::new().owner(target).build());
    let key = server.connect_with(&[player]);
    let mut client = TestClient::new(key, server.server.protocol().clone());

    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    assert_eq!(client.client.entity::<Player>(player).unwrap().base.owner, None);

    server.server.scope_mut(key).include(target);
    exchange_packets(&mut server, &mut [&mut client], PacketFate::Delivered);
    assert_eq!(client.client.entity::<Player>(player).unwrap().base.owner, Some(target));
}
