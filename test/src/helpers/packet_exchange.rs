use super::{TestClient, TestServer};

/// What happens to a packet or ack on its way
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketFate {
    Delivered,
    Dropped,
}

/// Runs one server tick: every connection's packet goes to its client,
/// and the client's ack straight back to the server when `acks` is
/// `Delivered`. Returns the packets that were sent, by client position.
///
/// # Panics
///
/// Panics if the server fails to build a packet or a client rejects one.
pub fn exchange_packets(
    server: &mut TestServer,
    clients: &mut [&mut TestClient],
    acks: PacketFate,
) -> Vec<Vec<u8>> {
    let packets = match server.server.send_updates(&server.world) {
        Ok(packets) => packets,
        Err(error) => panic!("server failed to send updates: {}", error),
    };

    let mut sent = Vec::with_capacity(clients.len());
    for client in clients.iter_mut() {
        let Some((_, bytes)) = packets.iter().find(|(key, _)| *key == client.key) else {
            panic!("no packet for connection {}", client.key);
        };
        match client.client.receive(bytes) {
            Ok(Some(ack)) => client.pending_acks.push(ack),
            Ok(None) => {}
            Err(error) => panic!("client {} rejected its packet: {}", client.key, error),
        }
        if acks == PacketFate::Delivered {
            for ack in client.pending_acks.drain(..) {
                if let Err(error) = server.server.receive_ack(client.key, ack) {
                    panic!("server rejected ack: {}", error);
                }
            }
        }
        sent.push(bytes.clone());
    }
    sent
}

/// Exchange packets multiple times
pub fn exchange_packets_n_times(
    server: &mut TestServer,
    clients: &mut [&mut TestClient],
    n: usize,
) -> Vec<Vec<Vec<u8>>> {
    (0..n)
        .map(|_| exchange_packets(server, clients, PacketFate::Delivered))
        .collect()
}
