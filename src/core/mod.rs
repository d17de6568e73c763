//! # Core Protocol Components
//!
//! Low-level packet handling, codecs, and text encodings.
//!
//! This module provides the foundation for the client, handling packet framing,
//! encoding/decoding, and wire format.
//!
//! ## Components
//! - **Packet**: Binary frame format with little-endian header fields
//! - **Codec**: Tokio codec for framing over byte streams
//! - **Encoding**: ASCII / UTF-8 body conversion
//!
//! ## Wire Format
//! ```text
//! [Length(4)] [Id(4)] [Type(4)] [Body(N)] [0x00] [0x00]
//! ```
//!
//! ## Limits
//! - Optional maximum frame size (0 = unbounded), applied in both directions
//! - Length validation before slicing

pub mod codec;
pub mod encoding;
pub mod packet;
