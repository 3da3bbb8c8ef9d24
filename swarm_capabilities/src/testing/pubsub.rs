use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use swarm_types::IngestError;

use crate::pubsub::{Publisher, PulledMessage, Subscriber};

/// In-memory `Publisher`/`Subscriber` fake backed by a shared queue, mirroring
/// `original_source/pkg/usecase/mock.go`'s in-memory pub/sub stub. `publish` enqueues a message
/// that a paired `MemoryPubSub` handle's `pull` dequeues; `ack`/`extend_deadline` are no-ops
/// since there is no redelivery timer to race against in-memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryPubSub {
    queue: Arc<Mutex<VecDeque<PulledMessage>>>,
}

impl MemoryPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Publisher for MemoryPubSub {
    async fn publish(&self, _topic: &str, payload: Vec<u8>) -> Result<(), IngestError> {
        let seq = self.queue.lock().len();
        self.queue.lock().push_back(PulledMessage {
            ack_id: format!("ack-{seq}"),
            message_id: format!("msg-{seq}"),
            data: payload,
            publish_time: chrono::Utc::now(),
            attributes: Default::default(),
        });
        Ok(())
    }
}

#[async_trait]
impl Subscriber for MemoryPubSub {
    async fn pull(
        &self,
        _subscription: &str,
        max_messages: usize,
    ) -> Result<Vec<PulledMessage>, IngestError> {
        let mut queue = self.queue.lock();
        let n = max_messages.min(queue.len());
        Ok(queue.drain(..n).collect())
    }

    async fn extend_deadline(
        &self,
        _subscription: &str,
        _ack_id: &str,
        _extension: Duration,
    ) -> Result<(), IngestError> {
        Ok(())
    }

    async fn ack(&self, _subscription: &str, _ack_id: &str) -> Result<(), IngestError> {
        Ok(())
    }
}
