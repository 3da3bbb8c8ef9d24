use hyper::{Body, Response, StatusCode};
use observability_deps::tracing::{error, warn};
use swarm_dedupe::Phase;
use swarm_types::{IngestError, RequestId};

use crate::state::AppState;

/// Outcome of handling one push message, before it's rendered to an HTTP response.
enum Outcome {
    Processed,
    SkippedDuplicate,
}

/// Decodes a push envelope, classifies it into load requests via `decode`, runs the dedupe
/// lease + coordinator pipeline, and renders the spec §6 response-code table. Shared by both
/// `/event/pubsub/cs` and `/event/pubsub/swarm`.
async fn handle_push_event<F, Fut>(
    state: &AppState,
    msg_type: &str,
    body: &[u8],
    decode: F,
) -> Response<Body>
where
    F: FnOnce(&[u8]) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<swarm_coordinator::LoadRequest>, IngestError>>,
{
    let data = match swarm_notify::decode_push_envelope(body) {
        Ok(data) => data,
        Err(err) => return error_response(&err),
    };

    let envelope: swarm_notify::PubSubBody = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(err) => {
            return error_response(&IngestError::MalformedRequest {
                message: format!("invalid pubsub envelope: {err}"),
            })
        }
    };
    let message_id = envelope.message.message_id.clone();

    match process(state, msg_type, &message_id, &data, decode).await {
        Ok(Outcome::Processed) | Ok(Outcome::SkippedDuplicate) => {
            Response::builder().status(StatusCode::OK).body(Body::empty()).unwrap()
        }
        Err(err) => error_response(&err),
    }
}

async fn process<F, Fut>(
    state: &AppState,
    msg_type: &str,
    message_id: &str,
    data: &[u8],
    decode: F,
) -> Result<Outcome, IngestError>
where
    F: FnOnce(&[u8]) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<swarm_coordinator::LoadRequest>, IngestError>>,
{
    let request_id = RequestId::new();
    let (held, acquired) = state
        .deduper
        .acquire(msg_type, message_id, request_id.clone())
        .await?;

    if !acquired {
        return match held.phase {
            Phase::Completed => {
                warn!(message_id, "duplicate delivery of completed message, skipping");
                Ok(Outcome::SkippedDuplicate)
            }
            _ => Err(IngestError::StateContention {
                id: message_id.to_string(),
            }),
        };
    }

    let result = handle_inner(state, &request_id, data, decode).await;

    let phase = if result.is_ok() { Phase::Completed } else { Phase::Failed };
    if let Err(err) = state.deduper.update(msg_type, message_id, phase).await {
        error!(message_id, error = %err, "failed to release dedupe lease");
    }

    result.map(|_| Outcome::Processed)
}

async fn handle_inner<F, Fut>(
    state: &AppState,
    request_id: &RequestId,
    data: &[u8],
    decode: F,
) -> Result<(), IngestError>
where
    F: FnOnce(&[u8]) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<swarm_coordinator::LoadRequest>, IngestError>>,
{
    let requests = decode(data).await?;
    let (_audit, result) = state.coordinator.load(request_id, requests).await;
    result
}

pub async fn handle_pubsub_cs(state: &AppState, body: &[u8]) -> Response<Body> {
    let policy = state.policy.clone();
    handle_push_event(state, "pubsub_cs", body, move |data| {
        let policy = policy.clone();
        let data = data.to_vec();
        async move { swarm_notify::adapt_object_event(policy.as_ref(), &data).await }
    })
    .await
}

pub async fn handle_pubsub_swarm(state: &AppState, body: &[u8]) -> Response<Body> {
    let policy = state.policy.clone();
    handle_push_event(state, "pubsub_swarm", body, move |data| {
        let policy = policy.clone();
        let data = data.to_vec();
        async move { swarm_notify::adapt_batched_event(policy.as_ref(), &data).await }
    })
    .await
}

pub fn health() -> Response<Body> {
    Response::builder().status(StatusCode::OK).body(Body::from("ok")).unwrap()
}

fn error_response(err: &IngestError) -> Response<Body> {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Response::builder().status(status).body(Body::from(err.to_string())).unwrap()
}
