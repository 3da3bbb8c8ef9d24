use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use swarm_capabilities::object_store::ObjectStore;
use swarm_capabilities::{Policy, Warehouse};
use swarm_schema::{infer, merge, schema_to_json, Schema};
use swarm_types::{Destination, IngestError, IngestId, InternalRecord, Object, RequestId, Source};

use crate::audit::{AuditRecord, IngestLog};
use crate::audit_sink::{audit_destination, write_audit_record};
use crate::row::materialize_row;

/// One (object, source) pair the Notification Adapter hands the coordinator (spec §4.6).
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub object: Object,
    pub source: Source,
}

/// Worker-pool widths for the two bounded stages (spec §4.6/§5). Defaults match the spec's
/// option table.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub read_concurrency: usize,
    pub ingest_table_concurrency: usize,
    pub ingest_record_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_concurrency: 32,
            ingest_table_concurrency: 16,
            ingest_record_concurrency: swarm_warehouse::DEFAULT_RECORD_CONCURRENCY,
        }
    }
}

/// Ingest Coordinator (C6) plus the Audit Log Sink it drives (C9). Owns the three external
/// capabilities the pipeline needs and the bounded worker-pool configuration; stateless
/// otherwise -- everything it touches is scoped to one `load` call.
#[derive(Debug, Clone)]
pub struct Coordinator {
    object_store: Arc<dyn ObjectStore>,
    policy: Arc<dyn Policy>,
    warehouse: Arc<dyn Warehouse>,
    config: Config,
    /// Audit destination, if configured (spec §4.9: "both or neither" of dataset/table).
    audit_destination: Option<Destination>,
}

impl Coordinator {
    pub fn new(
        object_store: Arc<dyn ObjectStore>,
        policy: Arc<dyn Policy>,
        warehouse: Arc<dyn Warehouse>,
        config: Config,
    ) -> Self {
        Self {
            object_store,
            policy,
            warehouse,
            config,
            audit_destination: None,
        }
    }

    pub fn with_audit_destination(mut self, dataset: impl Into<String>, table: impl Into<String>) -> Self {
        self.audit_destination = Some(audit_destination(dataset, table));
        self
    }

    /// Runs the full pipeline for one request: Stage A import, Stage B ingest, then (if
    /// configured) the audit write. Returns the audit record alongside the first
    /// destination-level error, per spec §4.6's failure model.
    pub async fn load(
        &self,
        request_id: &RequestId,
        requests: Vec<LoadRequest>,
    ) -> (AuditRecord, Result<(), IngestError>) {
        let started_at = Utc::now();

        let (sources, buckets) = self.import_stage(requests).await;
        let (ingests, first_error) = self.ingest_stage(buckets).await;

        let finished_at = Utc::now();
        let audit = AuditRecord {
            request_id: request_id.to_string(),
            started_at,
            finished_at,
            success: first_error.is_none(),
            error: first_error.as_ref().map(|e| e.to_string()),
            sources,
            ingests,
        };

        if let Some(destination) = &self.audit_destination {
            write_audit_record(
                self.warehouse.as_ref(),
                destination,
                &audit,
                self.config.ingest_record_concurrency,
            )
            .await;
        }

        let result = match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        };
        (audit, result)
    }

    /// Stage A (spec §4.6): a `read_concurrency`-wide worker pool imports every (object, source)
    /// pair and merges successful buckets into one per-destination map. A source's own import
    /// error never cancels its peers -- it's recorded on that source's `SourceLog` only.
    async fn import_stage(
        &self,
        requests: Vec<LoadRequest>,
    ) -> (Vec<swarm_importer::SourceLog>, BTreeMap<Destination, Vec<InternalRecord>>) {
        let object_store = self.object_store.clone();
        let policy = self.policy.clone();

        let results: Vec<_> = stream::iter(requests)
            .map(|req| {
                let object_store = object_store.clone();
                let policy = policy.clone();
                async move {
                    swarm_importer::import(object_store.as_ref(), policy.as_ref(), &req.object, &req.source)
                        .await
                }
            })
            .buffer_unordered(self.config.read_concurrency.max(1))
            .collect()
            .await;

        let mut sources = Vec::with_capacity(results.len());
        let mut merged: BTreeMap<Destination, Vec<InternalRecord>> = BTreeMap::new();
        for (log, outcome) in results {
            sources.push(log);
            if let Ok(buckets) = outcome {
                for (destination, records) in buckets {
                    merged.entry(destination).or_default().extend(records);
                }
            }
        }
        (sources, merged)
    }

    /// Stage B (spec §4.6): an `ingest_table_concurrency`-wide worker pool runs one ingest task
    /// per destination. Returns every task's log plus the first error encountered, in no
    /// particular order (spec: "no ordering guarantees ... across destinations").
    async fn ingest_stage(
        &self,
        buckets: BTreeMap<Destination, Vec<InternalRecord>>,
    ) -> (Vec<IngestLog>, Option<IngestError>) {
        let warehouse = self.warehouse.clone();
        let record_concurrency = self.config.ingest_record_concurrency;

        let results: Vec<_> = stream::iter(buckets)
            .map(|(destination, records)| {
                let warehouse = warehouse.clone();
                async move {
                    ingest_destination(warehouse.as_ref(), &destination, records, record_concurrency).await
                }
            })
            .buffer_unordered(self.config.ingest_table_concurrency.max(1))
            .collect()
            .await;

        let mut ingests = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (log, outcome) in results {
            if first_error.is_none() {
                if let Err(e) = outcome {
                    first_error = Some(e);
                }
            }
            ingests.push(log);
        }
        (ingests, first_error)
    }
}

/// One Stage B task (spec §4.6 steps 1-5): infer, reconcile, materialize, write, close.
async fn ingest_destination(
    warehouse: &dyn Warehouse,
    destination: &Destination,
    mut records: Vec<InternalRecord>,
    record_concurrency: usize,
) -> (IngestLog, Result<(), IngestError>) {
    let started_at = Utc::now();
    let ingest_id = IngestId::new().to_string();
    let row_count = records.len() as u64;

    let outcome =
        ingest_destination_inner(warehouse, destination, &mut records, &ingest_id, record_concurrency).await;

    let log = IngestLog {
        ingest_id,
        dataset: destination.dataset.clone(),
        table: destination.table.clone(),
        row_count,
        table_schema_json: outcome.as_ref().ok().cloned().unwrap_or_default(),
        started_at,
        finished_at: Utc::now(),
        success: outcome.is_ok(),
        error: outcome.as_ref().err().map(|e| e.to_string()),
    };
    (log, outcome.map(|_| ()))
}

async fn ingest_destination_inner(
    warehouse: &dyn Warehouse,
    destination: &Destination,
    records: &mut [InternalRecord],
    ingest_id: &str,
    record_concurrency: usize,
) -> Result<String, IngestError> {
    let data_schema = infer_merged(records)?;
    let full_schema = Schema::with_record_metadata(data_schema);

    for record in records.iter_mut() {
        record.ingest_id = ingest_id.to_string();
    }
    let values: Vec<swarm_types::Value> = records.iter().map(materialize_row).collect();

    let committed = swarm_warehouse::reconcile(warehouse, destination, &full_schema).await?;
    let table_schema_json = serde_json::to_string(&schema_to_json(&committed.schema))
        .map_err(|e| IngestError::Assertion { message: e.to_string() })?;

    swarm_warehouse::write_records(warehouse, destination, &values, record_concurrency, || {
        let full_schema = full_schema.clone();
        async move {
            swarm_warehouse::reconcile(warehouse, destination, &full_schema)
                .await
                .map(|m| m.schema)
        }
    })
    .await?;

    Ok(table_schema_json)
}

/// Schema-engine `infer` over every record's `data`, merged into one schema for the destination
/// (spec §4.6 step 1). A single ingest task never receives zero records (it's only spawned for
/// destination keys present in the merged map).
fn infer_merged(records: &[InternalRecord]) -> Result<Schema, IngestError> {
    let mut iter = records.iter();
    let first = iter.next().ok_or_else(|| IngestError::Assertion {
        message: "ingest task received no records".to_string(),
    })?;
    let mut schema = infer(&first.data)?;
    for record in iter {
        schema = merge(&schema, &infer(&record.data)?)?;
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use swarm_capabilities::object_store::{InMemory, Path};
    use swarm_capabilities::testing::{MemoryWarehouse, StaticPolicy};
    use swarm_types::{Compression, Parser, StoreRef};

    fn request(name: &str) -> LoadRequest {
        LoadRequest {
            object: Object::new(StoreRef::new("bucket", name), Vec::new()),
            source: Source::new(Parser::Json, "cloudtrail", Compression::None),
        }
    }

    #[tokio::test]
    async fn runs_end_to_end_across_two_sources_into_one_destination() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        store
            .put(&Path::from("a.json"), bytes::Bytes::from_static(b"{\"x\":1}\n"))
            .await
            .unwrap();
        store
            .put(&Path::from("b.json"), bytes::Bytes::from_static(b"{\"x\":2}\n"))
            .await
            .unwrap();

        let policy = StaticPolicy::new();
        let decision = json!({"logs": [{
            "destination": {"dataset": "ds", "table": "tbl", "partition_unit": "day"},
            "timestamp": 1700000000.0,
            "data": {"x": 1},
        }]});
        policy.set("schema.cloudtrail", decision);

        let warehouse = MemoryWarehouse::new();
        let coordinator = Coordinator::new(
            store,
            Arc::new(policy),
            Arc::new(warehouse),
            Config::default(),
        );

        let requests = vec![request("a.json"), request("b.json")];
        let request_id = RequestId::new();
        let (audit, result) = coordinator.load(&request_id, requests).await;

        assert!(result.is_ok());
        assert!(audit.success);
        assert_eq!(audit.sources.len(), 2);
        assert_eq!(audit.ingests.len(), 1);
        assert_eq!(audit.ingests[0].row_count, 2);
    }
}
