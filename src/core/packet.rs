//! # Packet
//!
//! Defines the `Packet` structure and its wire encoding.
//!
//! Every frame on the connection has the same shape, all integers little-endian:
//!
//! ```text
//! [Length(4)] [Id(4)] [Type(4)] [Body(N)] [0x00] [0x00]
//! ```
//!
//! `Length` counts everything after itself, so it is `N + 10`. The first NUL
//! terminates the body and the second is fixed protocol padding.
//!
//! ## Responsibilities
//! - Encode a `Packet` into raw bytes
//! - Decode exactly one frame from a raw buffer
//! - Validate declared lengths before slicing
//!
//! Both directions are pure functions; buffering of partial frames lives in
//! [`crate::core::codec`].

use bytes::{BufMut, BytesMut};

use crate::core::encoding::TextEncoding;
use crate::error::{constants, ProtocolError, Result};

/// Size of the length prefix
pub const HEADER_SIZE: usize = 4;

/// Smallest legal value of the length field: id + type + two terminators
pub const MIN_FRAME_LENGTH: usize = 10;

/// Bytes a frame adds around its body
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + MIN_FRAME_LENGTH;

/// Body the server sends back for the empty trailing request of a command
pub const COMPLETION_MARKER: &str = "\u{0}\u{1}\u{0}\u{0}";

/// Request id a server uses in AUTH_RESPONSE to reject a password
pub const AUTH_FAILED_ID: i32 = -1;

/// Packet kinds used by the protocol.
///
/// `AuthResponse` and `ExecCommand` share the numeric code `2`; which one a
/// frame carries depends on who sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Client login request
    Auth,
    /// Server answer to `Auth`
    AuthResponse,
    /// Client command request
    ExecCommand,
    /// Command output, or an empty client request used as a completion probe
    ResponseValue,
}

impl PacketType {
    /// Numeric code on the wire
    pub const fn code(self) -> i32 {
        match self {
            PacketType::Auth => 3,
            PacketType::AuthResponse => 2,
            PacketType::ExecCommand => 2,
            PacketType::ResponseValue => 0,
        }
    }

    /// Interpret a code sent by the server
    pub fn from_server(code: i32) -> Option<Self> {
        match code {
            2 => Some(PacketType::AuthResponse),
            0 => Some(PacketType::ResponseValue),
            _ => None,
        }
    }

    /// Interpret a code sent by a client
    pub fn from_client(code: i32) -> Option<Self> {
        match code {
            3 => Some(PacketType::Auth),
            2 => Some(PacketType::ExecCommand),
            0 => Some(PacketType::ResponseValue),
            _ => None,
        }
    }
}

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    /// Raw type code; see [`PacketType`] for interpretation
    pub kind: i32,
    pub body: String,
}

impl Packet {
    /// Build a packet of a known type
    pub fn new(packet_type: PacketType, id: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind: packet_type.code(),
            body: body.into(),
        }
    }

    /// True when the raw type code equals `packet_type`'s code
    pub fn is(&self, packet_type: PacketType) -> bool {
        self.kind == packet_type.code()
    }

    /// Total number of bytes this packet occupies on the wire
    pub fn frame_len(&self, encoding: TextEncoding) -> usize {
        FRAME_OVERHEAD + encoding.encoded_len(&self.body)
    }

    /// Append the encoded frame to `dst`
    pub fn encode_into(&self, encoding: TextEncoding, dst: &mut BytesMut) -> Result<()> {
        let body = encoding.encode(&self.body);
        let length = i32::try_from(MIN_FRAME_LENGTH + body.len()).map_err(|_| {
            ProtocolError::PacketTooLarge {
                size: FRAME_OVERHEAD + body.len(),
                max: i32::MAX as usize,
            }
        })?;

        dst.reserve(HEADER_SIZE + length as usize);
        dst.put_i32_le(length);
        dst.put_i32_le(self.id);
        dst.put_i32_le(self.kind);
        dst.put_slice(&body);
        dst.put_u8(0);
        dst.put_u8(0);
        Ok(())
    }

    /// Serialize a packet to a byte vector
    pub fn to_bytes(&self, encoding: TextEncoding) -> Result<Vec<u8>> {
        let mut out = BytesMut::with_capacity(self.frame_len(encoding));
        self.encode_into(encoding, &mut out)?;
        Ok(out.to_vec())
    }

    /// Parse exactly one frame from `buf`.
    ///
    /// `buf` must hold the length header and precisely the number of bytes it
    /// declares. The last two bytes are taken as terminators and dropped.
    pub fn from_bytes(buf: &[u8], encoding: TextEncoding) -> Result<Self> {
        let length = declared_length(buf)?
            .ok_or_else(|| ProtocolError::MalformedPacket(constants::ERR_SHORT_HEADER.into()))?;

        if length < MIN_FRAME_LENGTH {
            return Err(ProtocolError::MalformedPacket(format!(
                "{}: {length}",
                constants::ERR_LENGTH_TOO_SMALL
            )));
        }

        if buf.len() != HEADER_SIZE + length {
            return Err(ProtocolError::MalformedPacket(format!(
                "{}: declared {length}, got {}",
                constants::ERR_LENGTH_MISMATCH,
                buf.len() - HEADER_SIZE
            )));
        }

        let id = read_i32(&buf[4..8]);
        let kind = read_i32(&buf[8..12]);
        let body = encoding.decode(&buf[12..buf.len() - 2]);

        Ok(Packet { id, kind, body })
    }
}

/// Read the length prefix at the start of `buf`.
///
/// Returns `Ok(None)` while fewer than four bytes are available and an error
/// if the prefix is negative.
pub fn declared_length(buf: &[u8]) -> Result<Option<usize>> {
    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }
    let raw = read_i32(&buf[..HEADER_SIZE]);
    usize::try_from(raw)
        .map(Some)
        .map_err(|_| ProtocolError::MalformedPacket(format!("Negative frame length: {raw}")))
}

#[inline]
fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
