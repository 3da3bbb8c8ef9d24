use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use swarm_types::IngestError;

/// The policy evaluator capability (spec §1 out-of-scope collaborator): evaluate a named query
/// against a JSON input and bind the decision into a typed structure at the call site. Modeled
/// on `original_source/pkg/domain/interfaces/infra.go`'s `Policy` interface (backed by Rego in
/// the original; the query name and the JSON-in/JSON-out contract are all this trait commits to).
#[async_trait]
pub trait Policy: Send + Sync + Debug + 'static {
    /// Evaluates `query` (e.g. `"source"`, `"schema.cloudtrail"`, `"auth"`) against `input`,
    /// returning the decision's bound JSON value. Callers deserialize the result into the
    /// typed shape they expect (a list of Sources, a list of LogRows, an allow/deny bool).
    async fn evaluate(&self, query: &str, input: JsonValue) -> Result<JsonValue, IngestError>;
}
