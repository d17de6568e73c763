//! # Client Service
//!
//! The connection engine task and the [`RconClient`] handle that drives it.

pub mod client;
pub(crate) mod connection;

pub use client::RconClient;
