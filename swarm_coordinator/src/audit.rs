use chrono::{DateTime, Utc};

use swarm_importer::SourceLog;

/// One `ingests[]` entry of the ingest audit record (spec §3): one destination-level ingest
/// task's outcome.
#[derive(Debug, Clone)]
pub struct IngestLog {
    pub ingest_id: String,
    pub dataset: String,
    pub table: String,
    pub row_count: u64,
    pub table_schema_json: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
}

/// The full ingest audit record for one request (spec §3), written to the audit destination by
/// the Audit Log Sink (C9) if one is configured.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub request_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
    pub sources: Vec<SourceLog>,
    pub ingests: Vec<IngestLog>,
}
