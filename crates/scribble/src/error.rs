//! Unified error type for the Scribble server.

use scribble_protocol::ProtocolError;
use scribble_room::RoomError;
use scribble_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ScribbleError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid payload).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, not admin).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_protocol::PlayerId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::SendFailed(std::io::Error::other("gone"));
        let scribble_err: ScribbleError = err.into();
        assert!(matches!(scribble_err, ScribbleError::Transport(_)));
        assert!(scribble_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidDrawPayload("bad".into());
        let scribble_err: ScribbleError = err.into();
        assert!(matches!(scribble_err, ScribbleError::Protocol(_)));
        assert!(scribble_err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotAdmin(PlayerId(3));
        let scribble_err: ScribbleError = err.into();
        assert!(matches!(scribble_err, ScribbleError::Room(_)));
    }
}
