use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use swarm_types::IngestError;

use crate::state::{Phase, State};
use crate::store::StateStore;

/// In-memory `StateStore` fake, standing in for the firestore-backed transaction the teacher's
/// original pairs this with. Guards its map with a single mutex, which is a faithful stand-in
/// for a single-document transaction since all access is already serialized through it.
#[derive(Debug, Default, Clone)]
pub struct MemoryStateStore {
    documents: Arc<Mutex<BTreeMap<(String, String), State>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, msg_type: &str, id: &str) -> Result<Option<State>, IngestError> {
        Ok(self
            .documents
            .lock()
            .get(&(msg_type.to_string(), id.to_string()))
            .cloned())
    }

    async fn compare_and_set(
        &self,
        msg_type: &str,
        candidate: State,
    ) -> Result<(State, bool), IngestError> {
        let key = (msg_type.to_string(), candidate.id.clone());
        let mut documents = self.documents.lock();
        match documents.get(&key) {
            Some(existing) if !existing.acquirable(candidate.created_at) => {
                Ok((existing.clone(), false))
            }
            _ => {
                documents.insert(key, candidate.clone());
                Ok((candidate, true))
            }
        }
    }

    async fn update_phase(
        &self,
        msg_type: &str,
        id: &str,
        phase: Phase,
        updated_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), IngestError> {
        let key = (msg_type.to_string(), id.to_string());
        if let Some(doc) = self.documents.lock().get_mut(&key) {
            doc.phase = phase;
            doc.updated_at = updated_at;
        }
        Ok(())
    }
}
