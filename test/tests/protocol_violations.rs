/// Malformed update streams are reported as errors, close only the
/// connection they arrived on, and never panic.
use proptest::prelude::*;

use propnet_client::{Client, ClientConfig, ClientError};
use propnet_shared::{
    constants::{
        CLASS_ID_CHUNK_BITS, ENTITY_INDEX_CHUNK_BITS, PROPERTY_COUNT_CHUNK_BITS,
        PROPERTY_INDEX_CHUNK_BITS, SERIAL_BITS,
    },
    write_unsigned, write_variable, BitWrite, BitWriter, ProtocolViolation, Serde, UpdateKind,
    UpdateWriter,
};
use propnet_test::{exchange_packets, protocol, PacketFate, PlayerBuilder, TestClient, TestServer};

/// Header, empty removal list, then one record's prefix for entity `index`
fn record_prefix(writer: &mut BitWriter, index: u64, class_id: u64, kind: UpdateKind) {
    UpdateWriter::write_header(writer, 0);
    UpdateWriter::finish_section(writer);
    true.ser(writer);
    write_variable(writer, index, ENTITY_INDEX_CHUNK_BITS);
    write_unsigned(writer, 0, SERIAL_BITS);
    write_variable(writer, class_id, CLASS_ID_CHUNK_BITS);
    kind.ser(writer);
}

fn client() -> Client {
    Client::new(ClientConfig::default(), protocol())
}

#[test]
fn unknown_class_id() {
    let mut writer = BitWriter::new();
    record_prefix(&mut writer, 0, 9, UpdateKind::Full);
    let mut client = client();

    assert_eq!(
        client.receive(&writer.to_bytes()),
        Err(ClientError::Violation(ProtocolViolation::UnknownClass { class_id: 9 }))
    );
    assert!(!client.is_connected());
}

#[test]
fn property_index_out_of_bounds() {
    let mut writer = BitWriter::new();
    record_prefix(&mut writer, 0, 1, UpdateKind::Delta);
    write_variable(&mut writer, 1, PROPERTY_COUNT_CHUNK_BITS);
    write_variable(&mut writer, 40, PROPERTY_INDEX_CHUNK_BITS);
    let mut client = client();

    let result = client.receive(&writer.to_bytes());
    assert!(matches!(
        result,
        Err(ClientError::Violation(ProtocolViolation::PropertyIndexOutOfBounds { index: 40, .. }))
    ));
}

#[test]
fn property_indices_must_increase() {
    let mut writer = BitWriter::new();
    record_prefix(&mut writer, 0, 0, UpdateKind::Delta);
    write_variable(&mut writer, 2, PROPERTY_COUNT_CHUNK_BITS);
    // BaseEntity: health (index 1) is 8 bits, then origin (index 0)
    write_variable(&mut writer, 1, PROPERTY_INDEX_CHUNK_BITS);
    writer.write_byte(7);
    write_variable(&mut writer, 0, PROPERTY_INDEX_CHUNK_BITS);
    let mut client = client();

    let result = client.receive(&writer.to_bytes());
    assert!(matches!(
        result,
        Err(ClientError::Violation(ProtocolViolation::PropertyIndexNotIncreasing { index: 0, previous: 1, .. }))
    ));
}

#[test]
fn truncated_packet() {
    let mut server = TestServer::new(protocol());
    let player = server.world.spawn(PlayerBuilder::new().name("truncated").build());
    let key = server.connect_with(&[player]);
    let packets = server.server.send_updates(&server.world).unwrap();
    let mut bytes = packets[0].1.clone();
    bytes.truncate(bytes.len() / 2);

    let mut client = TestClient::new(key, server.server.protocol().clone());
    assert_eq!(
        client.client.receive(&bytes),
        Err(ClientError::Violation(ProtocolViolation::Truncated))
    );
}

#[test]
fn violation_closes_only_that_connection() {
    let mut server = TestServer::new(protocol());
    let player = server.world.spawn(PlayerBuilder::new().build());
    let healthy_key = server.connect_with(&[player]);
    let protocol = server.server.protocol().clone();
    let mut healthy = TestClient::new(healthy_key, protocol.clone());
    let mut broken = Client::new(ClientConfig::default(), protocol);

    assert!(broken.receive(&[0xFF]).is_err());
    assert_eq!(broken.receive(&[0, 0, 0]), Err(ClientError::Disconnected));

    exchange_packets(&mut server, &mut [&mut healthy], PacketFate::Delivered);
    assert!(healthy.client.is_connected());
    assert_eq!(healthy.client.entity_count(), 1);
}

proptest! {
    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut client = client();
        match client.receive(&bytes) {
            Ok(_) => prop_assert!(client.is_connected()),
            Err(_) => prop_assert!(!client.is_connected()),
        }
    }
}
