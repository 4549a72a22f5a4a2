//! Codec trait and the default JSON implementation.
//!
//! The rest of the server never touches `serde_json` directly — it goes
//! through [`Codec`], so the wire format can be swapped for a binary one
//! without touching the handler or lobby code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes protocol values to bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T)
    -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, which is what the browser client speaks and what makes
/// DevTools inspection painless. Behind the `json` feature flag (default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, Envelope};

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let env = Envelope {
            seq: 1,
            timestamp: 250,
            event: ClientEvent::ListRooms,
        };
        let bytes = codec.encode(&env).unwrap();
        let decoded: Envelope<ClientEvent> = codec.decode(&bytes).unwrap();
        assert_eq!(env, decoded);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let codec = JsonCodec;
        let result: Result<Envelope<ClientEvent>, _> =
            codec.decode(b"not json at all");
        assert!(result.is_err());
    }
}
