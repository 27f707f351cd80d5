//! Error types for the protocol layer.

/// Errors from encoding or decoding events, or from validating values
/// that arrive from clients.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Bad JSON, an unknown event name, or missing or mistyped fields.
    #[error("malformed event: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid room code: {0}")]
    InvalidRoomCode(String),
}
