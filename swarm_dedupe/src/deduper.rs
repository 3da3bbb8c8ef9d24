use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use observability_deps::tracing::{info, warn};
use swarm_types::{IngestError, RequestId};

use crate::state::{Phase, State};
use crate::store::StateStore;

/// Default interval `wait` polls the store at (spec §4.7).
pub const STATE_CHECK_INTERVAL: Duration = Duration::from_secs(10);
/// Default overall timeout for `wait` (spec §4.7).
pub const STATE_WAIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Exclusive-lease, record-lifecycle state machine for redelivery dedup (spec §4.7). When no
/// `StateStore` is configured it degrades to "at-least-once": `acquire` always succeeds,
/// `update`/`wait` are no-ops.
#[derive(Clone)]
pub struct Deduper {
    store: Option<Arc<dyn StateStore>>,
    state_timeout: Duration,
    state_ttl: Duration,
    state_check_interval: Duration,
}

impl Deduper {
    pub fn new(store: Option<Arc<dyn StateStore>>, state_timeout: Duration, state_ttl: Duration) -> Self {
        if store.is_none() {
            warn!("no state store configured, Deduper running in degraded at-least-once mode");
        }
        Self {
            store,
            state_timeout,
            state_ttl,
            state_check_interval: STATE_CHECK_INTERVAL,
        }
    }

    #[cfg(test)]
    fn with_check_interval(mut self, interval: Duration) -> Self {
        self.state_check_interval = interval;
        self
    }

    /// Attempts to acquire exclusive processing rights for `(msg_type, id)`. Returns the state
    /// actually stored and whether this call acquired it (spec §4.7's transition table).
    pub async fn acquire(
        &self,
        msg_type: &str,
        id: &str,
        request_id: RequestId,
    ) -> Result<(State, bool), IngestError> {
        let now = Utc::now();
        let candidate = State {
            id: id.to_string(),
            request_id,
            phase: Phase::Running,
            created_at: now,
            updated_at: now,
            expires_at: now
                + chrono::Duration::from_std(self.state_timeout).unwrap_or(chrono::Duration::zero()),
            ttl_at: now
                + chrono::Duration::from_std(self.state_ttl).unwrap_or(chrono::Duration::zero()),
        };

        match &self.store {
            None => Ok((candidate, true)),
            Some(store) => store.compare_and_set(msg_type, candidate).await,
        }
    }

    /// Marks `(msg_type, id)` `Completed` or `Failed`. A no-op in degraded mode.
    pub async fn update(&self, msg_type: &str, id: &str, phase: Phase) -> Result<(), IngestError> {
        match &self.store {
            None => Ok(()),
            Some(store) => store.update_phase(msg_type, id, phase, Utc::now()).await,
        }
    }

    /// Polls until `(msg_type, id)` leaves `Running`, `now > expires_at`, or `wait_timeout`
    /// elapses (the last surfaces `StateWaitTimeout`). A no-op in degraded mode.
    pub async fn wait(
        &self,
        msg_type: &str,
        id: &str,
        expires_at: chrono::DateTime<Utc>,
        wait_timeout: Duration,
    ) -> Result<(), IngestError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let deadline = tokio::time::Instant::now() + wait_timeout;
        loop {
            let current = store.get(msg_type, id).await?;
            match current {
                None => return Ok(()),
                Some(state) if state.phase != Phase::Running => {
                    info!(%id, phase = ?state.phase, "wait observed state leave Running");
                    return Ok(());
                }
                _ if Utc::now() > expires_at => return Ok(()),
                _ => {}
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(IngestError::StateWaitTimeout { id: id.to_string() });
            }
            tokio::time::sleep(self.state_check_interval).await;
        }
    }
}

impl std::fmt::Debug for Deduper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deduper")
            .field("degraded", &self.store.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStateStore;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn second_acquire_while_running_is_rejected() {
        let store = Arc::new(MemoryStateStore::new());
        let deduper = Deduper::new(
            Some(store),
            StdDuration::from_secs(1800),
            StdDuration::from_secs(7 * 24 * 3600),
        );

        let (_, first) = deduper.acquire("test", "id-1", RequestId::new()).await.unwrap();
        let (_, second) = deduper.acquire("test", "id-1", RequestId::new()).await.unwrap();
        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn acquire_after_completed_is_rejected() {
        let store = Arc::new(MemoryStateStore::new());
        let deduper = Deduper::new(
            Some(store),
            StdDuration::from_secs(1800),
            StdDuration::from_secs(7 * 24 * 3600),
        );

        deduper.acquire("test", "id-1", RequestId::new()).await.unwrap();
        deduper.update("test", "id-1", Phase::Completed).await.unwrap();
        let (_, acquired) = deduper.acquire("test", "id-1", RequestId::new()).await.unwrap();
        assert!(!acquired);
    }

    #[tokio::test]
    async fn acquire_after_failed_succeeds() {
        let store = Arc::new(MemoryStateStore::new());
        let deduper = Deduper::new(
            Some(store),
            StdDuration::from_secs(1800),
            StdDuration::from_secs(7 * 24 * 3600),
        );

        deduper.acquire("test", "id-1", RequestId::new()).await.unwrap();
        deduper.update("test", "id-1", Phase::Failed).await.unwrap();
        let (_, acquired) = deduper.acquire("test", "id-1", RequestId::new()).await.unwrap();
        assert!(acquired);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_while_running() {
        let store = Arc::new(MemoryStateStore::new());
        let deduper = Deduper::new(
            Some(store),
            StdDuration::from_secs(1800),
            StdDuration::from_secs(7 * 24 * 3600),
        )
        .with_check_interval(StdDuration::from_millis(10));

        deduper.acquire("test", "id-1", RequestId::new()).await.unwrap();
        let far_future = Utc::now() + chrono::Duration::hours(1);
        let result = deduper
            .wait("test", "id-1", far_future, StdDuration::from_millis(50))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn degraded_mode_always_acquires() {
        let deduper = Deduper::new(None, StdDuration::from_secs(1800), StdDuration::from_secs(600));
        let (_, first) = deduper.acquire("test", "id-1", RequestId::new()).await.unwrap();
        let (_, second) = deduper.acquire("test", "id-1", RequestId::new()).await.unwrap();
        assert!(first);
        assert!(second);
    }
}
