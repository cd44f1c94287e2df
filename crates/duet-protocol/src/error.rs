//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// These are internal failures (encoding a message, decoding a server
/// reply in a client or test). Rejections of client frames before a match
/// are not errors here; they are [`ErrorCode`](crate::ErrorCode)s sent
/// back to the client.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON or invalid UTF-8.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame is valid JSON but not a message this protocol defines,
    /// e.g. an unknown opcode or a MATCHED frame with a bad role.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
