//! # Packet Codec
//!
//! Tokio codec framing RCON packets over a byte stream.
//!
//! TCP gives no message boundaries, so a single read may hold half a frame or
//! several frames back to back. The decoder keeps whatever is incomplete in the
//! read buffer and yields frames one at a time, in arrival order.
//!
//! Both directions honour `max_packet_size` when it is non-zero. Outbound frames
//! over the limit fail with `PacketTooLarge`; inbound frames over the limit are
//! malformed, since buffering them is exactly what the limit exists to prevent.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::core::encoding::TextEncoding;
use crate::core::packet::{declared_length, Packet, HEADER_SIZE, MIN_FRAME_LENGTH};
use crate::error::{constants, ProtocolError, Result};

/// Most the decoder reserves ahead of received bytes for one partial frame
const RESERVE_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct RconCodec {
    encoding: TextEncoding,
    /// 0 means unbounded
    max_packet_size: usize,
}

impl RconCodec {
    pub fn new(encoding: TextEncoding, max_packet_size: usize) -> Self {
        Self {
            encoding,
            max_packet_size,
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Fail with `PacketTooLarge` if `packet` would exceed the configured limit
    pub fn check_size(&self, packet: &Packet) -> Result<()> {
        let size = packet.frame_len(self.encoding);
        if self.max_packet_size > 0 && size > self.max_packet_size {
            return Err(ProtocolError::PacketTooLarge {
                size,
                max: self.max_packet_size,
            });
        }
        Ok(())
    }
}

impl Decoder for RconCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let length = match declared_length(src)? {
            Some(length) => length,
            None => return Ok(None),
        };

        if length < MIN_FRAME_LENGTH {
            return Err(ProtocolError::MalformedPacket(format!(
                "{}: {length}",
                constants::ERR_LENGTH_TOO_SMALL
            )));
        }

        let total = HEADER_SIZE + length;
        if self.max_packet_size > 0 && total > self.max_packet_size {
            return Err(ProtocolError::MalformedPacket(format!(
                "Inbound frame of {total} bytes exceeds maximum {}",
                self.max_packet_size
            )));
        }

        if src.len() < total {
            // The header alone is untrusted; grow with the bytes that arrive
            src.reserve((total - src.len()).min(RESERVE_CHUNK));
            return Ok(None);
        }

        let frame = src.split_to(total);
        let packet = Packet::from_bytes(&frame, self.encoding)?;
        trace!(id = packet.id, kind = packet.kind, bytes = total, "Decoded frame");
        Ok(Some(packet))
    }
}

impl Encoder<Packet> for RconCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        self.check_size(&item)?;
        item.encode_into(self.encoding, dst)
    }
}
