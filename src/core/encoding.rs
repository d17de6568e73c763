//! # Text Encodings
//!
//! Packet bodies are text. The protocol itself does not say which character set
//! is on the wire, so the client lets the caller pick between plain ASCII (what
//! most game servers speak) and UTF-8.
//!
//! ## Behaviour
//! - **Ascii**: characters above `0x7F` become `?` in both directions
//! - **Utf8**: outbound is the string's own bytes, inbound invalid sequences are
//!   replaced with `U+FFFD`

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Supported body encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// 7-bit ASCII (default)
    #[default]
    Ascii,
    /// UTF-8
    Utf8,
}

impl TextEncoding {
    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Ascii => "ascii",
            TextEncoding::Utf8 => "utf8",
        }
    }

    /// Encode a body into wire bytes
    pub fn encode<'a>(self, text: &'a str) -> Cow<'a, [u8]> {
        match self {
            TextEncoding::Utf8 => Cow::Borrowed(text.as_bytes()),
            TextEncoding::Ascii if text.is_ascii() => Cow::Borrowed(text.as_bytes()),
            TextEncoding::Ascii => Cow::Owned(
                text.chars()
                    .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                    .collect(),
            ),
        }
    }

    /// Number of bytes `text` occupies on the wire
    pub fn encoded_len(self, text: &str) -> usize {
        match self {
            TextEncoding::Utf8 => text.len(),
            TextEncoding::Ascii => text.chars().count(),
        }
    }

    /// Decode wire bytes into a body
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(TextEncoding::Ascii),
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            other => Err(ProtocolError::ConfigError(format!(
                "Unknown text encoding: {other} (expected 'ascii' or 'utf8')"
            ))),
        }
    }
}
