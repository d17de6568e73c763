//! # rcon-protocol
//!
//! Async client for the remote console (RCON) protocol spoken by Source-engine
//! and Minecraft servers, among others.
//!
//! The protocol is a plaintext stream of little-endian, length-prefixed
//! frames. A client logs in with a password, then sends text commands and
//! reads back their text output, which the server may split over several
//! frames without marking the last one.
//!
//! ## Layers
//! - [`core`]: frame encoding/decoding and the tokio codec
//! - [`protocol`]: request ids, response reassembly, session state
//! - [`service`]: the connection task and the [`RconClient`] handle
//! - [`transport`]: TCP connect with optional local bind
//! - [`config`], [`error`], [`utils`]: configuration, errors, logging, metrics
//!
//! ## Example
//! ```no_run
//! use rcon_protocol::{ClientConfig, RconClient};
//!
//! # async fn run() -> rcon_protocol::Result<()> {
//! let client = RconClient::connect(ClientConfig::default()).await?;
//! client.authenticate("password").await?;
//! let players = client.execute("users").await?;
//! # let _ = players;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use config::{ClientConfig, LoggingConfig, RconConfig};
pub use crate::core::codec::RconCodec;
pub use crate::core::encoding::TextEncoding;
pub use crate::core::packet::{Packet, PacketType};
pub use error::{ProtocolError, Result};
pub use protocol::session::SessionState;
pub use service::RconClient;
