#![allow(clippy::unwrap_used, clippy::panic)]

use bytes::BytesMut;
use rcon_protocol::core::packet::COMPLETION_MARKER;
use rcon_protocol::protocol::reassembler::{InFlightTable, Reassembly};
use rcon_protocol::{Packet, PacketType, RconCodec, TextEncoding};
use tokio_util::codec::{Decoder, Encoder};

#[test]
fn stress_packet_encode_decode_large_series() {
    // Heavy burst of frames through one codec and buffer; no leftovers allowed
    let mut codec = RconCodec::default();
    let mut buf = BytesMut::new();

    for size in [0usize, 1, 64, 512, 4096, 65536] {
        let body = "a".repeat(size);
        for id in 0..2_000 {
            codec
                .encode(
                    Packet::new(PacketType::ResponseValue, id, body.as_str()),
                    &mut buf,
                )
                .unwrap();
            let decoded = codec.decode(&mut buf).unwrap().unwrap();
            assert_eq!(decoded.id, id);
            assert_eq!(decoded.body.len(), size);
            assert!(buf.is_empty());
        }
    }
}

#[test]
fn stress_from_bytes_many_sizes() {
    for size in (0..=8192).step_by(7) {
        let packet = Packet::new(PacketType::ExecCommand, 256, "z".repeat(size));
        let bytes = packet.to_bytes(TextEncoding::Ascii).unwrap();
        let decoded = Packet::from_bytes(&bytes, TextEncoding::Ascii).unwrap();
        assert_eq!(decoded, packet);
    }
}

#[test]
fn stress_reassembly_many_fragments() {
    // A single response split over thousands of frames, repeated to cycle ids
    let mut table = InFlightTable::new();

    for round in 0..50 {
        let (request, ack) = table.allocate_pair().unwrap();
        assert_eq!((request, ack), (1, 2), "ids should be reused each round");
        table.insert_command(request, ack, round);

        for i in 0..2_000 {
            let id = if i % 2 == 0 { request } else { ack };
            assert!(matches!(
                table.on_response_value(id, "0123456789"),
                Reassembly::Appended { .. }
            ));
        }

        match table.on_response_value(ack, COMPLETION_MARKER) {
            Reassembly::Complete {
                body, continuation, ..
            } => {
                assert_eq!(continuation, round);
                assert_eq!(body.len(), 20_000);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(table.is_empty());
    }
}
