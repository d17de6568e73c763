#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use rcon_protocol::core::packet::COMPLETION_MARKER;
use rcon_protocol::{ClientConfig, Packet, PacketType, RconClient, RconCodec};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinSet;
use tokio_util::codec::Framed;

/// Minimal server: accepts any password and echoes each command back,
/// split in two frames, followed by the probe answer.
async fn echo_server<T>(io: T)
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(io, RconCodec::default());
    while let Some(Ok(packet)) = framed.next().await {
        let replies = if packet.is(PacketType::Auth) {
            vec![
                Packet::new(PacketType::ResponseValue, packet.id, ""),
                Packet::new(PacketType::AuthResponse, packet.id, ""),
            ]
        } else if packet.is(PacketType::ExecCommand) {
            let (head, tail) = packet.body.split_at(packet.body.len() / 2);
            vec![
                Packet::new(PacketType::ResponseValue, packet.id, head),
                Packet::new(PacketType::ResponseValue, packet.id, tail),
            ]
        } else {
            vec![
                Packet::new(PacketType::ResponseValue, packet.id, ""),
                Packet::new(PacketType::ResponseValue, packet.id, COMPLETION_MARKER),
            ]
        };

        for reply in replies {
            if framed.send(reply).await.is_err() {
                return;
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_execute_from_cloned_handles() {
    let (client_io, server_io) = tokio::io::duplex(256 * 1024);
    tokio::spawn(echo_server(server_io));

    let client = RconClient::from_stream(client_io, &ClientConfig::default());
    client.authenticate("secret").await.unwrap();

    let mut tasks = JoinSet::new();
    for worker in 0..8 {
        let client = client.clone();
        tasks.spawn(async move {
            for i in 0..250 {
                let command = format!("say worker {worker} message {i}");
                let output = client.execute(&command).await.unwrap();
                assert_eq!(output, command);
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let snapshot = client.metrics();
    assert_eq!(snapshot.commands_sent, 2_000);
    assert_eq!(snapshot.commands_completed, 2_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_burst_within_id_space() {
    let (client_io, server_io) = tokio::io::duplex(256 * 1024);
    tokio::spawn(echo_server(server_io));

    let client = Arc::new(RconClient::from_stream(client_io, &ClientConfig::default()));
    client.authenticate("secret").await.unwrap();

    // 100 pairs fit in the 256-id space even if none complete before the last is sent
    let mut tasks = JoinSet::new();
    for i in 0..100 {
        let client = client.clone();
        tasks.spawn(async move {
            let command = format!("status {i}");
            (command.clone(), client.execute(&command).await)
        });
    }

    while let Some(res) = tasks.join_next().await {
        let (command, output) = res.unwrap();
        assert_eq!(output.unwrap(), command);
    }

    client.disconnect().await.unwrap();
    assert!(client.is_closed());
}
