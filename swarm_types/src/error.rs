use thiserror::Error;

/// The error kinds enumerated by the ingestion design (spec §7). Each carries the context
/// needed to reproduce `original_source`'s `goerr.Wrap(err, ...).With("k", v)` attachment without
/// a bespoke error-context crate: plain struct fields on the variant.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid configuration: {message}")]
    ConfigInvalid { message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("malformed request: {message}")]
    MalformedRequest { message: String },

    #[error("no source matched object {object_ref}")]
    PolicyMissing { object_ref: String },

    #[error("policy decision violates schema for {object_ref}: {message}")]
    PolicyInvalid { object_ref: String, message: String },

    #[error("failed to read object {object_ref}: {source}")]
    SourceRead {
        object_ref: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to parse object {object_ref}: {source}")]
    SourceParse {
        object_ref: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("policy evaluation failed for {object_ref}: {source}")]
    PolicyError {
        object_ref: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid log row from {object_ref}: {message}")]
    InvalidLogRow { object_ref: String, message: String },

    #[error("schema conflict on field `{field_path}`: {message}")]
    SchemaConflict { field_path: String, message: String },

    #[error("table etag conflict for {dataset}.{table}")]
    TableConflict { dataset: String, table: String },

    #[error("table not found: {dataset}.{table}")]
    TableNotFound { dataset: String, table: String },

    #[error("schema mismatch writing {dataset}.{table}, reconnect required")]
    SchemaMismatch { dataset: String, table: String },

    #[error("append count mismatch for {dataset}.{table}: expected {expected}, got {actual}")]
    AppendCountMismatch {
        dataset: String,
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("warehouse transport error for {dataset}.{table}: {source}")]
    WarehouseTransport {
        dataset: String,
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("state {id} is held by another worker")]
    StateContention { id: String },

    #[error("timed out waiting for state {id} to leave Running")]
    StateWaitTimeout { id: String },

    #[error("memory limit exceeded: {used} bytes over {limit} bytes")]
    MemoryExceeded { used: u64, limit: u64 },

    #[error("assertion failed: {message}")]
    Assertion { message: String },
}

impl IngestError {
    /// The HTTP status this error kind maps to, per spec §6's response-code table.
    pub fn status_code(&self) -> u16 {
        match self {
            IngestError::Unauthorized => 401,
            IngestError::StateContention { .. } => 205,
            IngestError::StateWaitTimeout { .. } | IngestError::MemoryExceeded { .. } => 429,
            IngestError::Assertion { .. } => 500,
            _ => 400,
        }
    }
}
