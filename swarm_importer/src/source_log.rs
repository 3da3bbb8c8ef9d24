use chrono::{DateTime, Utc};
use swarm_types::{Compression, Parser};

/// One `sources[]` entry of the ingest audit record (spec §3), describing one (object, source)
/// import attempt regardless of whether it succeeded.
#[derive(Debug, Clone)]
pub struct SourceLog {
    pub object_ref: String,
    pub parser: Parser,
    pub schema_tag: String,
    pub compression: Compression,
    pub row_count: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
}
