#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use rcon_protocol::{Packet, RconCodec, TextEncoding};
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // Fuzz frame parsing - test for panics, crashes, infinite loops
    let _ = Packet::from_bytes(data, TextEncoding::Ascii);
    let _ = Packet::from_bytes(data, TextEncoding::Utf8);

    let mut codec = RconCodec::new(TextEncoding::Ascii, 4096);
    let mut buf = BytesMut::from(data);
    while let Ok(Some(_)) = codec.decode(&mut buf) {}
});
