use chrono::{DateTime, Utc};
use swarm_types::RequestId;

/// Lifecycle phase of one message-id's processing (spec §3/§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Completed,
    Failed,
}

/// Persisted dedup state for one message-id, stored one document per `id` in the
/// `{msgType}` collection (spec §6 "Persisted state layout").
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: String,
    pub request_id: RequestId,
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ttl_at: DateTime<Utc>,
}

impl State {
    /// Whether a lease holder may still be acquiring this id's processing right at `now`
    /// (spec §4.7's acquisition table, mirroring `original_source`'s `model.State.Acquired`).
    pub fn acquirable(&self, now: DateTime<Utc>) -> bool {
        match self.phase {
            Phase::Running => self.expires_at <= now,
            Phase::Completed => false,
            Phase::Failed => true,
        }
    }
}
