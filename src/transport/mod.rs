//! # Transport
//!
//! Socket setup. The protocol engine itself runs over any
//! `AsyncRead + AsyncWrite` stream; this module only opens TCP ones.

pub mod tcp;
