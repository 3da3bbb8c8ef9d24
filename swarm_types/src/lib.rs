//! Shared data types threaded through the swarm ingest pipeline: the untyped `Value` tree,
//! the `Object`/`Source`/`Destination`/`LogRow`/`InternalRecord` data model from the pipeline's
//! design, request-scoped ids, and the `IngestError` kind enum.

mod destination;
mod error;
mod hash;
mod ids;
mod logrow;
mod object;
mod record;
mod source;
mod value;

pub use destination::{Destination, PartitionUnit};
pub use error::IngestError;
pub use hash::stable_content_hash;
pub use ids::{IngestId, RequestId};
pub use logrow::LogRow;
pub use object::{Digest, Object, StoreRef};
pub use record::{unix_seconds_to_instant, InternalRecord};
pub use source::{Compression, Parser, Source};
pub use value::Value;
