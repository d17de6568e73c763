use bytes::BytesMut;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rcon_protocol::core::packet::COMPLETION_MARKER;
use rcon_protocol::protocol::reassembler::InFlightTable;
use rcon_protocol::{Packet, PacketType, RconCodec, TextEncoding};
use tokio_util::codec::{Decoder, Encoder};

#[allow(clippy::unwrap_used)]
fn bench_packet_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_encode_decode");
    let body_sizes = [16usize, 512, 4096, 65536];

    for &size in &body_sizes {
        let body = "x".repeat(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("encode_{size}b"), |b| {
            b.iter_batched(
                || Packet::new(PacketType::ExecCommand, 1, body.as_str()),
                |packet| {
                    let mut buf = BytesMut::with_capacity(size + 14);
                    let mut codec = RconCodec::default();
                    codec.encode(packet, &mut buf).unwrap();
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("decode_{size}b"), |b| {
            let bytes = Packet::new(PacketType::ResponseValue, 1, body.as_str())
                .to_bytes(TextEncoding::Ascii)
                .unwrap();
            b.iter_batched(
                || BytesMut::from(&bytes[..]),
                |mut buf| {
                    let mut codec = RconCodec::default();
                    assert!(codec.decode(&mut buf).unwrap().is_some());
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassembly");
    for &fragments in &[1usize, 16, 256] {
        group.bench_function(format!("{fragments}_fragments"), |b| {
            b.iter(|| {
                let mut table = InFlightTable::new();
                let (request, ack) = table.allocate_pair().unwrap();
                table.insert_command(request, ack, ());
                for _ in 0..fragments {
                    table.on_response_value(request, "fragment of server output\n");
                }
                table.on_response_value(ack, COMPLETION_MARKER)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_packet_encode_decode, bench_reassembly);
criterion_main!(benches);
