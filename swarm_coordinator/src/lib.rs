//! Ingest Coordinator (C6: classify → import sources in parallel → ingest per-destination in
//! parallel) and the Audit Log Sink it drives (C9: one structured record per ingestion).

mod audit;
mod audit_sink;
mod coordinator;
mod row;

pub use audit::{AuditRecord, IngestLog};
pub use audit_sink::{audit_destination, audit_record_to_value, audit_schema};
pub use coordinator::{Config, Coordinator, LoadRequest};
pub use row::materialize_row;
