//! Error types for Harmony

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a binary frame is rejected by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than the fixed 8-byte header
    #[error("frame truncated: {len} bytes, header needs 8")]
    Truncated {
        /// Received length in bytes
        len: usize,
    },

    /// Payload does not carry one i16 per set mask bit
    #[error("payload is {actual} bytes, mask implies {expected}")]
    PayloadLength {
        /// Bytes implied by the mask popcount
        expected: usize,
        /// Bytes actually present after the header
        actual: usize,
    },

    /// Bits above the two 14-bit device masks are set
    #[error("reserved mask bits set: {mask:#010x}")]
    ReservedBits {
        /// Combined mask as received
        mask: u32,
    },
}

/// Harmony error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket protocol or transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Binary frame could not be decoded
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] FrameError),

    /// Sink is gone (viewer disconnected)
    #[error("Sink closed")]
    SinkClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
