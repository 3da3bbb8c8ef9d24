use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use swarm_types::IngestError;

/// One message pulled from a subscription in pull-worker mode.
#[derive(Debug, Clone)]
pub struct PulledMessage {
    pub ack_id: String,
    pub message_id: String,
    pub data: Vec<u8>,
    pub publish_time: DateTime<Utc>,
    pub attributes: BTreeMap<String, String>,
}

/// The pub/sub transport's publish side (spec §1 out-of-scope collaborator), used by the
/// `enqueue` CLI flow.
#[async_trait]
pub trait Publisher: Send + Sync + Debug + 'static {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), IngestError>;
}

/// The pub/sub transport's pull side, used by the pull-worker mode described in spec §2/§5:
/// `pull` retrieves a batch, `extend_deadline` is called periodically by the deadline-extender
/// task while a message is still being processed, `ack` releases it.
#[async_trait]
pub trait Subscriber: Send + Sync + Debug + 'static {
    async fn pull(
        &self,
        subscription: &str,
        max_messages: usize,
    ) -> Result<Vec<PulledMessage>, IngestError>;

    async fn extend_deadline(
        &self,
        subscription: &str,
        ack_id: &str,
        extension: Duration,
    ) -> Result<(), IngestError>;

    async fn ack(&self, subscription: &str, ack_id: &str) -> Result<(), IngestError>;
}
