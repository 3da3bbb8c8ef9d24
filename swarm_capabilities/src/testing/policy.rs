use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use swarm_types::IngestError;

use crate::policy::Policy;

/// A `Policy` fake that returns a fixed, pre-registered decision per query name, mirroring
/// `original_source/pkg/usecase/mock.go`'s static policy stub used in its own test suite.
/// Queries with no registered decision return `PolicyMissing`.
#[derive(Debug, Default, Clone)]
pub struct StaticPolicy {
    decisions: Arc<Mutex<BTreeMap<String, JsonValue>>>,
}

impl StaticPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, query: impl Into<String>, decision: JsonValue) {
        self.decisions.lock().insert(query.into(), decision);
    }
}

#[async_trait]
impl Policy for StaticPolicy {
    async fn evaluate(&self, query: &str, _input: JsonValue) -> Result<JsonValue, IngestError> {
        self.decisions
            .lock()
            .get(query)
            .cloned()
            .ok_or_else(|| IngestError::PolicyMissing {
                object_ref: query.to_string(),
            })
    }
}
