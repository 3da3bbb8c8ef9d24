use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use swarm_schema::Schema;
use swarm_types::{Destination, IngestError};

use crate::warehouse::{AppendAck, PendingStream, TableMetadata, Warehouse};

/// In-memory `Warehouse` fake, mirroring `original_source/pkg/usecase/mock.go`'s in-memory
/// BigQuery stub. Tables are keyed by `Destination`; `update_table` enforces the etag CAS the
/// same way the real warehouse does, so tests can exercise `TableConflict`.
#[derive(Debug, Default, Clone)]
pub struct MemoryWarehouse {
    tables: Arc<Mutex<BTreeMap<Destination, TableMetadata>>>,
    next_etag: Arc<Mutex<u64>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_etag(&self) -> String {
        let mut n = self.next_etag.lock();
        *n += 1;
        n.to_string()
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn get_metadata(
        &self,
        destination: &Destination,
    ) -> Result<Option<TableMetadata>, IngestError> {
        Ok(self.tables.lock().get(destination).cloned())
    }

    async fn create_table(
        &self,
        destination: &Destination,
        schema: &Schema,
    ) -> Result<TableMetadata, IngestError> {
        let metadata = TableMetadata {
            schema: schema.clone(),
            etag: self.fresh_etag(),
        };
        self.tables
            .lock()
            .insert(destination.clone(), metadata.clone());
        Ok(metadata)
    }

    async fn update_table(
        &self,
        destination: &Destination,
        schema: &Schema,
        etag: &str,
    ) -> Result<TableMetadata, IngestError> {
        let mut tables = self.tables.lock();
        let current = tables
            .get(destination)
            .ok_or_else(|| IngestError::Assertion {
                message: format!("update_table called for unknown destination {destination}"),
            })?;
        if current.etag != etag {
            return Err(IngestError::TableConflict {
                dataset: destination.dataset.clone(),
                table: destination.table.clone(),
            });
        }
        let updated = TableMetadata {
            schema: schema.clone(),
            etag: self.fresh_etag(),
        };
        tables.insert(destination.clone(), updated.clone());
        Ok(updated)
    }

    async fn new_stream(
        &self,
        destination: &Destination,
        schema: &Schema,
    ) -> Result<Box<dyn PendingStream>, IngestError> {
        Ok(Box::new(MemoryPendingStream {
            destination: destination.clone(),
            schema: schema.clone(),
            rows: Vec::new(),
            finalized: false,
        }))
    }
}

/// In-memory pending-commit stream: appends accumulate in a `Vec`, `finalize` freezes the count,
/// `commit` is a no-op. Good enough to test the chunking/retry logic in `swarm_warehouse` without
/// a real warehouse.
#[derive(Debug)]
struct MemoryPendingStream {
    #[allow(dead_code)]
    destination: Destination,
    #[allow(dead_code)]
    schema: Schema,
    rows: Vec<Vec<u8>>,
    finalized: bool,
}

#[async_trait]
impl PendingStream for MemoryPendingStream {
    async fn append(&mut self, encoded_rows: Vec<Vec<u8>>) -> Result<AppendAck, IngestError> {
        if self.finalized {
            return Err(IngestError::Assertion {
                message: "append called after finalize".to_string(),
            });
        }
        let accepted_count = encoded_rows.len() as u64;
        self.rows.extend(encoded_rows);
        Ok(AppendAck {
            accepted_count,
            schema_mismatch: false,
        })
    }

    async fn finalize(&mut self) -> Result<u64, IngestError> {
        self.finalized = true;
        Ok(self.rows.len() as u64)
    }

    async fn commit(&mut self) -> Result<(), IngestError> {
        Ok(())
    }
}
