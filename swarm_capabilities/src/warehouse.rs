use std::fmt::Debug;

use async_trait::async_trait;
use swarm_schema::Schema;
use swarm_types::{Destination, IngestError};

/// Table metadata as returned by the warehouse: the committed schema plus an opaque etag used
/// for compare-and-swap updates.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub schema: Schema,
    pub etag: String,
}

/// The warehouse SDK capability (spec §1 out-of-scope collaborator): get-metadata, create-table,
/// update-table, new-stream. Modeled on `original_source/pkg/domain/interfaces/infra.go`'s
/// `BigQuery` interface and on `write_buffer`'s one-trait-per-capability style.
#[async_trait]
pub trait Warehouse: Send + Sync + Debug + 'static {
    async fn get_metadata(
        &self,
        destination: &Destination,
    ) -> Result<Option<TableMetadata>, IngestError>;

    async fn create_table(
        &self,
        destination: &Destination,
        schema: &Schema,
    ) -> Result<TableMetadata, IngestError>;

    async fn update_table(
        &self,
        destination: &Destination,
        schema: &Schema,
        etag: &str,
    ) -> Result<TableMetadata, IngestError>;

    async fn new_stream(
        &self,
        destination: &Destination,
        schema: &Schema,
    ) -> Result<Box<dyn PendingStream>, IngestError>;
}

/// Acknowledgement for one append call against a pending-commit stream.
#[derive(Debug, Clone, Copy)]
pub struct AppendAck {
    pub accepted_count: u64,
    /// Set when the warehouse rejected the append because the stream's bound schema no longer
    /// matches the destination's committed schema; the caller must reopen a new stream.
    pub schema_mismatch: bool,
}

/// The raw pending-commit append transport for one destination (spec §4.4's state machine,
/// minus chunking/retry/encoding — those live in `swarm_warehouse::StreamingWriter`, which wraps
/// this trait). Modeled on `original_source/pkg/infra/bq/stream.go`.
#[async_trait]
pub trait PendingStream: Send + Sync + Debug {
    /// Appends one chunk of already proto-encoded rows.
    async fn append(&mut self, encoded_rows: Vec<Vec<u8>>) -> Result<AppendAck, IngestError>;

    /// Finalizes the stream (no further appends); returns the total row count the warehouse
    /// finalized, which the caller compares against the count it issued.
    async fn finalize(&mut self) -> Result<u64, IngestError>;

    /// Atomically commits the finalized stream, making its rows visible.
    async fn commit(&mut self) -> Result<(), IngestError>;
}
