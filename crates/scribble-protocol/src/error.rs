//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound event failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame is not a well-formed [`ClientEvent`](crate::ClientEvent).
    ///
    /// Common causes: malformed JSON, an unknown `event` name, or missing
    /// required fields.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A `draw` event decoded but its stroke payload is unusable.
    #[error("invalid draw payload: {0}")]
    InvalidDrawPayload(String),

    /// The string is not four ASCII letters.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),
}
