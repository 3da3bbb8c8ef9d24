use async_trait::async_trait;
use swarm_types::IngestError;

use crate::state::State;

/// The external transactional key-value store the Deduper is built on (spec §4.7's `db`
/// capability): a single-key compare-and-set performed inside a transaction. Modeled on
/// `original_source/pkg/domain/interfaces/infra.go`'s `Database` interface and
/// `pkg/infra/firestore/client.go`'s `RunTransaction`-based implementation.
#[async_trait]
pub trait StateStore: Send + Sync + std::fmt::Debug + 'static {
    /// Reads the current state for `(msg_type, id)`, if any document exists.
    async fn get(&self, msg_type: &str, id: &str) -> Result<Option<State>, IngestError>;

    /// Transactionally reads the current state and, iff `candidate` may acquire (per
    /// `State::acquirable`, evaluated against `candidate.created_at` as "now"), writes
    /// `candidate` in its place. Returns the document actually stored after the transaction
    /// (either `candidate`, on acquisition, or the pre-existing document) and whether
    /// acquisition happened.
    async fn compare_and_set(
        &self,
        msg_type: &str,
        candidate: State,
    ) -> Result<(State, bool), IngestError>;

    /// Merges `phase`/`updated_at` into the existing document. A no-op if no document exists.
    async fn update_phase(
        &self,
        msg_type: &str,
        id: &str,
        phase: crate::state::Phase,
        updated_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), IngestError>;
}
