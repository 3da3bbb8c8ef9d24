use std::sync::Arc;
use std::time::Duration;

use observability_deps::tracing::{error, info, warn};
use swarm_capabilities::Subscriber;
use swarm_dedupe::Phase;
use swarm_types::RequestId;

use crate::state::AppState;

/// How often the deadline-extender renews a message's lease while it's being processed, and by
/// how much, per spec §5: "Pull worker extends the message lease every 60 s by 90 s".
const EXTEND_INTERVAL: Duration = Duration::from_secs(60);
const EXTEND_BY: Duration = Duration::from_secs(90);

/// Runs one subscription's pull loop forever: pull a batch, process each message concurrently,
/// ack once done. Pulled messages always carry the batched abstract event shape (spec §4.8) --
/// the Object-event shape only arrives over the push HTTP surface, since Cloud Storage itself
/// has no pull-subscription notion.
pub async fn run(
    state: Arc<AppState>,
    subscriber: Arc<dyn Subscriber>,
    subscription: String,
) {
    loop {
        let batch = match subscriber.pull(&subscription, 10).await {
            Ok(batch) => batch,
            Err(err) => {
                error!(subscription, error = %err, "pull failed, backing off");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        if batch.is_empty() {
            tokio::time::sleep(Duration::from_secs(1)).await;
            continue;
        }

        for message in batch {
            let state = state.clone();
            let subscriber = subscriber.clone();
            let subscription = subscription.clone();
            tokio::spawn(async move {
                process_one(state, subscriber, subscription, message).await;
            });
        }
    }
}

async fn process_one(
    state: Arc<AppState>,
    subscriber: Arc<dyn Subscriber>,
    subscription: String,
    message: swarm_capabilities::PulledMessage,
) {
    let msg_type = format!("pull:{subscription}");
    let expires_at = message.publish_time + chrono::Duration::minutes(30);

    let request_id = RequestId::new();
    let acquire = state
        .deduper
        .acquire(&msg_type, &message.message_id, request_id.clone())
        .await;

    // Whether it's safe to ack the message once this function returns. Acking removes it from
    // the subscription for good, so it's only safe when this worker did the processing itself
    // or independently confirmed, at acquire time, that a prior worker already completed it.
    // A contended `Running` lease is NOT enough, even after `wait()` returns `Ok`: the holder
    // may have crashed without ever calling `update()`, or `wait()` may have given up on its own
    // timeout rather than observed a terminal phase (spec §5's lease-survives-cancellation
    // guarantee relies on the broker redelivering in that case, not on this worker acking on its
    // behalf).
    let should_process;
    let safe_to_ack;
    match acquire {
        Ok((_, true)) => {
            should_process = true;
            safe_to_ack = true;
        }
        Ok((held, false)) if held.phase == Phase::Completed => {
            warn!(message_id = %message.message_id, "duplicate delivery of completed message, skipping");
            should_process = false;
            safe_to_ack = true;
        }
        Ok((_, false)) => {
            if let Err(err) = state.deduper.wait(&msg_type, &message.message_id, expires_at, Duration::from_secs(120)).await {
                warn!(message_id = %message.message_id, error = %err, "wait for competing worker timed out");
            }
            should_process = false;
            safe_to_ack = false;
        }
        Err(err) => {
            error!(message_id = %message.message_id, error = %err, "dedupe acquire failed");
            should_process = false;
            safe_to_ack = false;
        }
    };

    if should_process {
        let extender = spawn_deadline_extender(subscriber.clone(), subscription.clone(), message.ack_id.clone());

        let result = swarm_notify::adapt_batched_event(state.policy.as_ref(), &message.data).await;

        let outcome = match result {
            Ok(requests) => {
                let (_audit, result) = state.coordinator.load(&request_id, requests).await;
                result
            }
            Err(err) => Err(err),
        };

        extender.abort();

        let phase = if outcome.is_ok() { Phase::Completed } else { Phase::Failed };
        if let Err(err) = state.deduper.update(&msg_type, &message.message_id, phase).await {
            error!(message_id = %message.message_id, error = %err, "failed to release dedupe lease");
        }
        if let Err(err) = outcome {
            warn!(message_id = %message.message_id, error = %err, "pull message processing failed");
        }
    }

    if safe_to_ack {
        if let Err(err) = subscriber.ack(&subscription, &message.ack_id).await {
            error!(message_id = %message.message_id, error = %err, "failed to ack message");
        } else {
            info!(message_id = %message.message_id, "acked message");
        }
    } else {
        info!(message_id = %message.message_id, "leaving message unacked for broker redelivery");
    }
}

fn spawn_deadline_extender(
    subscriber: Arc<dyn Subscriber>,
    subscription: String,
    ack_id: String,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(EXTEND_INTERVAL).await;
            if let Err(err) = subscriber.extend_deadline(&subscription, &ack_id, EXTEND_BY).await {
                warn!(ack_id, error = %err, "failed to extend message deadline");
            }
        }
    })
}
