//! # Protocol State
//!
//! Everything the connection needs to turn decoded packets into answers.
//!
//! ## Components
//! - **ids**: request id allocation in the 1..=256 window
//! - **reassembler**: in-flight table and multi-packet response assembly
//! - **session**: authentication state machine
//! - **dispatcher**: inbound routing by packet type
//!
//! None of these touch the socket; the connection task in
//! [`crate::service::connection`] drives them one packet at a time.

pub mod dispatcher;
pub mod ids;
pub mod reassembler;
pub mod session;
