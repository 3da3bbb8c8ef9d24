//! Table Manager (C3: reconcile inferred schema against warehouse metadata) and the
//! pending-commit Streaming Writer (C4: chunked append, finalize, commit, schema-mismatch
//! retry) built on top of the `Warehouse` capability.

mod encode;
mod reconcile;
mod writer;

pub use encode::encode_record;
pub use reconcile::reconcile;
pub use writer::{write_records, CHUNK_ROWS, DEFAULT_RECORD_CONCURRENCY};
