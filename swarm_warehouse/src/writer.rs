use std::ops::ControlFlow;
use std::time::Duration;

use backoff::{Backoff, BackoffConfig};
use futures::stream::{self, StreamExt, TryStreamExt};
use observability_deps::tracing::{info, warn};
use swarm_capabilities::{PendingStream, Warehouse};
use swarm_schema::Schema;
use swarm_types::{Destination, IngestError, Value};
use tokio::sync::Mutex as AsyncMutex;

use crate::encode::encode_record;

/// Maximum rows appended per chunk (spec §4.4).
pub const CHUNK_ROWS: usize = 256;

/// Default inner worker-pool width for chunk dispatch against one destination's stream (spec
/// §4.6 `INGEST_RECORD_CONCURRENCY`). The stream itself is exclusively owned (spec §3
/// "Ownership"), so the pool bounds how many chunks are encoded and queued for `append`
/// concurrently rather than how many `append` calls run at once.
pub const DEFAULT_RECORD_CONCURRENCY: usize = 16;

/// Overall retry envelope around the whole open/append/finalize/commit cycle (spec §4.4/§5):
/// chosen to exceed the warehouse's documented schema-propagation delay.
const RETRY_DEADLINE: Duration = Duration::from_secs(15 * 60);

const BACKOFF_INIT: Duration = Duration::from_millis(10);
const BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Drives the pending-commit protocol for one destination end to end, retrying the whole cycle
/// on schema-mismatch or append-count-mismatch by reopening a fresh stream against a refreshed
/// schema (spec §4.4's `[Aborted: reopen]` transition). `reconcile` is invoked on every retry
/// attempt so a schema that evolved mid-retry is picked up.
pub async fn write_records<'a, F, Fut>(
    warehouse: &'a dyn Warehouse,
    destination: &'a Destination,
    records: &'a [Value],
    record_concurrency: usize,
    reconcile: F,
) -> Result<u64, IngestError>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Schema, IngestError>> + Send,
{
    let config = BackoffConfig {
        init_backoff: BACKOFF_INIT,
        max_backoff: BACKOFF_MAX,
        base: 2.0,
    };
    let mut backoff = Backoff::new(&config);

    let reconcile = &reconcile;
    let attempt = async {
        backoff
            .retry_with_backoff("streaming_writer", || async {
                match attempt_once(warehouse, destination, records, record_concurrency, reconcile)
                    .await
                {
                    Ok(count) => ControlFlow::Break(Ok(count)),
                    Err(e) if is_retriable(&e) => {
                        warn!(%destination, error=%e, "retrying streaming write");
                        ControlFlow::Continue(e)
                    }
                    Err(e) => ControlFlow::Break(Err(e)),
                }
            })
            .await
            .expect("backoff retry is infallible")
    };

    match tokio::time::timeout(RETRY_DEADLINE, attempt).await {
        Ok(result) => result,
        Err(_) => Err(IngestError::WarehouseTransport {
            dataset: destination.dataset.clone(),
            table: destination.table.clone(),
            source: format!("retry envelope of {RETRY_DEADLINE:?} exceeded").into(),
        }),
    }
}

fn is_retriable(err: &IngestError) -> bool {
    matches!(
        err,
        IngestError::SchemaMismatch { .. }
            | IngestError::AppendCountMismatch { .. }
            | IngestError::TableConflict { .. }
    )
}

async fn attempt_once<F, Fut>(
    warehouse: &dyn Warehouse,
    destination: &Destination,
    records: &[Value],
    record_concurrency: usize,
    reconcile: &F,
) -> Result<u64, IngestError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Schema, IngestError>>,
{
    let schema = reconcile().await?;
    let mut stream = warehouse.new_stream(destination, &schema).await?;
    let appended =
        insert_all(stream.as_mut(), destination, &schema, records, record_concurrency).await?;

    let finalized = stream.finalize().await?;
    if finalized != appended {
        return Err(IngestError::AppendCountMismatch {
            dataset: destination.dataset.clone(),
            table: destination.table.clone(),
            expected: appended as usize,
            actual: finalized as usize,
        });
    }
    stream.commit().await?;
    info!(%destination, rows = appended, "committed stream");
    Ok(appended)
}

/// Encodes and appends `records` in chunks of [`CHUNK_ROWS`], running up to `record_concurrency`
/// chunks through encoding concurrently. The stream is exclusively owned per spec §3's
/// Ownership note, so append calls themselves still serialize through a mutex -- only the
/// (CPU-bound) proto encoding overlaps across chunks.
async fn insert_all(
    stream: &mut dyn PendingStream,
    destination: &Destination,
    schema: &Schema,
    records: &[Value],
    record_concurrency: usize,
) -> Result<u64, IngestError> {
    let stream = AsyncMutex::new(stream);
    let chunks: Vec<&[Value]> = records.chunks(CHUNK_ROWS).collect();

    let accepted: Vec<u64> = stream::iter(chunks)
        .map(|chunk| {
            let stream = &stream;
            async move {
                let encoded: Vec<Vec<u8>> =
                    chunk.iter().map(|r| encode_record(schema, r)).collect();
                let ack = stream.lock().await.append(encoded).await?;
                if ack.schema_mismatch {
                    return Err(IngestError::SchemaMismatch {
                        dataset: destination.dataset.clone(),
                        table: destination.table.clone(),
                    });
                }
                Ok(ack.accepted_count)
            }
        })
        .buffer_unordered(record_concurrency.max(1))
        .try_collect()
        .await?;

    Ok(accepted.into_iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use swarm_capabilities::testing::MemoryWarehouse;
    use swarm_schema::infer;
    use swarm_types::PartitionUnit;

    fn destination() -> Destination {
        Destination::new("ds", "tbl", PartitionUnit::None)
    }

    fn record(n: i64) -> Value {
        let mut m = BTreeMap::new();
        m.insert("n".to_string(), Value::Int(n));
        Value::Object(m)
    }

    #[tokio::test]
    async fn writes_all_records_and_commits() {
        let warehouse = MemoryWarehouse::new();
        let records: Vec<Value> = (0..600).map(record).collect();
        let schema = infer(&records[0]).unwrap();

        let count = write_records(&warehouse, &destination(), &records, 4, || {
            let warehouse = warehouse.clone();
            let destination = destination();
            let schema = schema.clone();
            async move {
                crate::reconcile::reconcile(&warehouse, &destination, &schema)
                    .await
                    .map(|m| m.schema)
            }
        })
        .await
        .unwrap();

        assert_eq!(count, 600);
    }
}
