//! Notification Adapter (C8): decodes the two event envelope shapes the HTTP/pull surfaces
//! accept and turns each Object into the coordinator's `LoadRequest`s (spec §4.8).

mod batched_event;
mod classify;
mod envelope;
mod object_event;

pub use batched_event::BatchedEvent;
pub use classify::object_to_load_requests;
pub use envelope::{decode_push_envelope, PubSubBody, PubSubMessage};
pub use object_event::ObjectEvent;

use swarm_capabilities::Policy;
use swarm_coordinator::LoadRequest;
use swarm_types::IngestError;

/// Decodes one Object-event message body (spec §4.8's "Object-event" shape) and classifies it
/// into its load requests.
pub async fn adapt_object_event(
    policy: &dyn Policy,
    body: &[u8],
) -> Result<Vec<LoadRequest>, IngestError> {
    let event: ObjectEvent =
        serde_json::from_slice(body).map_err(|e| IngestError::MalformedRequest {
            message: format!("invalid object-event payload: {e}"),
        })?;
    classify::object_to_load_requests(policy, event.into_object()).await
}

/// Decodes one batched abstract-event message body (spec §4.8's "Batched abstract event"
/// shape) and classifies every carried Object into its load requests.
pub async fn adapt_batched_event(
    policy: &dyn Policy,
    body: &[u8],
) -> Result<Vec<LoadRequest>, IngestError> {
    let batch: BatchedEvent =
        serde_json::from_slice(body).map_err(|e| IngestError::MalformedRequest {
            message: format!("invalid batched-event payload: {e}"),
        })?;

    let mut requests = Vec::new();
    for dto in batch.objects {
        requests.extend(classify::object_to_load_requests(policy, dto.into_object()).await?);
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_capabilities::testing::StaticPolicy;

    fn policy_with_one_source() -> StaticPolicy {
        let policy = StaticPolicy::new();
        policy.set(
            "source",
            serde_json::json!({"sources": [
                {"parser": "json", "schema_tag": "cloudtrail", "compression": "none"},
            ]}),
        );
        policy
    }

    #[tokio::test]
    async fn adapts_object_event_end_to_end() {
        let policy = policy_with_one_source();
        let body = serde_json::json!({
            "bucket": "b",
            "name": "n",
            "size": "10",
            "md5Hash": base64::encode([1, 2, 3]),
            "timeCreated": "2024-01-01T00:00:00.000Z",
        })
        .to_string();

        let requests = adapt_object_event(&policy, body.as_bytes()).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].object.store_ref.bucket, "b");
    }

    #[tokio::test]
    async fn adapts_batched_event_across_multiple_objects() {
        let policy = policy_with_one_source();
        let body = serde_json::json!({
            "objects": [
                {"store_ref": {"bucket": "b", "name": "n1"}},
                {"store_ref": {"bucket": "b", "name": "n2"}},
            ]
        })
        .to_string();

        let requests = adapt_batched_event(&policy, body.as_bytes()).await.unwrap();
        assert_eq!(requests.len(), 2);
    }
}
