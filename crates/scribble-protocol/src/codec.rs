//! Codec trait and the JSON implementation used on the wire.
//!
//! The server never touches `serde_json` directly; it goes through a
//! [`Codec`] so tests and alternative transports can swap the format.

use serde::{Serialize, de::DeserializeOwned};

use crate::{ClientEvent, ProtocolError, ServerEvent};

/// Converts values to and from wire bytes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes one inbound frame.
    fn decode_client(&self, data: &[u8]) -> Result<ClientEvent, ProtocolError> {
        self.decode(data)
    }

    /// Encodes one outbound frame.
    fn encode_server(&self, event: &ServerEvent) -> Result<Vec<u8>, ProtocolError> {
        self.encode(event)
    }
}

/// A [`Codec`] backed by `serde_json`. Browsers receive these frames as text.
///
/// ```rust
/// use scribble_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let event = codec
///     .decode_client(br#"{"event":"chat-message","data":{"text":"hi"}}"#)
///     .unwrap();
/// assert_eq!(event, ClientEvent::ChatMessage { text: "hi".into() });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlayerId;

    #[test]
    fn test_encode_server_event_is_utf8_json() {
        let bytes = JsonCodec
            .encode_server(&ServerEvent::Connected { player_id: PlayerId(3) })
            .unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert_eq!(text, r#"{"event":"connected","data":{"playerId":3}}"#);
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let err = JsonCodec.decode_client(b"not json at all").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_decode_wrong_shape_returns_error() {
        assert!(JsonCodec.decode_client(br#"{"name":"hello"}"#).is_err());
    }
}
