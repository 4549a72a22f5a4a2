//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating
/// protocol data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed — malformed or unexpected bytes.
    #[cfg(feature = "json")]
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// A room code failed validation (wrong length or alphabet).
    #[error("malformed room code: {0:?}")]
    BadRoomCode(String),

    /// A structurally valid message arrived at the wrong time
    /// (e.g. a room event before the handshake).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
