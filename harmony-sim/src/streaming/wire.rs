//! Wire formats and outbound message shape
//!
//! Harmony streams one of two formats, fixed for the lifetime of the server:
//!
//! ### JSON
//! - One text message per tick carrying a [`Snapshot`](super::messages::Snapshot)
//! - Self-describing, easy to inspect from a browser console
//!
//! ### Binary
//! - One binary message per tick carrying a delta or full [`Frame`](crate::codec::Frame)
//! - 8 bytes when nothing changed, 64 bytes at most
//!
//! Control replies are always text, whatever the streaming format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported streaming formats
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Verbose JSON snapshot per tick
    #[default]
    Json,
    /// Delta-encoded binary frame per tick
    Binary,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormat::Json => write!(f, "json"),
            WireFormat::Binary => write!(f, "binary"),
        }
    }
}

/// One WebSocket message queued for a viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Binary(Vec<u8>),
}

impl Outbound {
    /// Payload size in bytes
    pub fn len(&self) -> usize {
        match self {
            Outbound::Text(text) => text.len(),
            Outbound::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Outbound> for tungstenite::Message {
    fn from(message: Outbound) -> Self {
        match message {
            Outbound::Text(text) => tungstenite::Message::Text(text),
            Outbound::Binary(bytes) => tungstenite::Message::Binary(bytes),
        }
    }
}
