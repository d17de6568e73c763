//! # Error Types
//!
//! Error handling for the RCON client.
//!
//! This module defines every error a caller can observe, from low-level I/O
//! failures to session misuse such as executing a command before logging in.
//!
//! ## Error Categories
//! - **Framing Errors**: Malformed inbound frames, oversized outbound frames
//! - **Allocation Errors**: No free request id in the 1..=256 window
//! - **Session Errors**: Already/not authenticated, rejected password, auth timeout
//! - **Transport Errors**: Socket failures, peer close, unwritable connection
//!
//! All errors implement `std::error::Error` for interoperability.
//!
//! ## Example Usage
//! ```rust
//! use rcon_protocol::error::{ProtocolError, Result};
//! use tracing::{error, info};
//!
//! fn check_reply(body: &str) -> Result<&str> {
//!     if body.is_empty() {
//!         return Err(ProtocolError::MalformedPacket("empty reply".into()));
//!     }
//!     Ok(body)
//! }
//!
//! match check_reply("") {
//!     Ok(body) => info!(body, "Got reply"),
//!     Err(e) => error!(error = %e, "Bad reply"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Framing errors
    pub const ERR_SHORT_HEADER: &str = "Frame shorter than its 4-byte length header";
    pub const ERR_LENGTH_MISMATCH: &str = "Declared frame length does not match available bytes";
    pub const ERR_LENGTH_TOO_SMALL: &str = "Declared frame length below protocol minimum";

    /// Connection errors
    pub const ERR_CONNECTION_CLOSED: &str = "Connection closed";
    pub const ERR_PEER_CLOSED: &str = "Connection closed by peer";
    pub const ERR_AUTH_REJECTED_CLOSE: &str = "Connection closed after authentication was rejected";
    pub const ERR_ENGINE_GONE: &str = "Connection task stopped before replying";
}

// ProtocolError is the error type for every client operation
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("No request id available (all 256 slots in flight)")]
    IdExhaustion,

    #[error("Packet too large: {size} bytes (maximum {max})")]
    PacketTooLarge { size: usize, max: usize },

    #[error("Already authenticated")]
    AlreadyAuthenticated,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authentication already in progress")]
    AuthInProgress,

    #[error("Authentication timed out")]
    AuthTimeout,

    #[error("Authentication rejected by server")]
    AuthRejected,

    #[error("Unable to write to socket")]
    NotWritable,

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
