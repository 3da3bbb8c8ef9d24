use std::collections::BTreeMap;

use serde::Deserialize;
use swarm_types::IngestError;

/// The push-subscription HTTP body: a Pub/Sub message wrapper around the base64-encoded
/// payload, mirroring `original_source`'s `PubSubBody`/`PubSubMessage`.
#[derive(Debug, Deserialize)]
pub struct PubSubBody {
    pub message: PubSubMessage,
    pub subscription: String,
}

#[derive(Debug, Deserialize)]
pub struct PubSubMessage {
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub data: String,
    pub message_id: String,
    pub publish_time: String,
}

/// Unwraps a push envelope and base64-decodes its `message.data` field, yielding the raw bytes
/// the rest of the adapter decodes into an event shape.
pub fn decode_push_envelope(body: &[u8]) -> Result<Vec<u8>, IngestError> {
    let parsed: PubSubBody =
        serde_json::from_slice(body).map_err(|e| IngestError::MalformedRequest {
            message: format!("invalid pubsub envelope: {e}"),
        })?;
    base64::decode(&parsed.message.data).map_err(|e| IngestError::MalformedRequest {
        message: format!("invalid base64 in pubsub message data: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_and_decodes_data() {
        let payload = base64::encode(b"{\"x\":1}");
        let body = format!(
            r#"{{"message":{{"data":"{payload}","message_id":"m1","publish_time":"2024-01-01T00:00:00Z","attributes":{{}}}},"subscription":"sub"}}"#
        );
        let decoded = decode_push_envelope(body.as_bytes()).unwrap();
        assert_eq!(decoded, b"{\"x\":1}");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(decode_push_envelope(b"not json").is_err());
    }
}
