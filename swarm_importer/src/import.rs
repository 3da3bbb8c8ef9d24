use std::collections::BTreeMap;

use chrono::Utc;
use observability_deps::tracing::warn;
use swarm_capabilities::object_store::ObjectStore;
use swarm_capabilities::Policy;
use swarm_schema::clean;
use swarm_types::{
    stable_content_hash, unix_seconds_to_instant, Destination, IngestError, InternalRecord, Object,
    Source,
};

use crate::decision::parse_decision;
use crate::download::download;
use crate::parse::parse_json_stream;
use crate::source_log::SourceLog;

/// Per-destination buckets of materialized rows, one Source Importer's output for one (object,
/// source) pair (spec §4.5).
pub type PerDestinationBuckets = BTreeMap<Destination, Vec<InternalRecord>>;

/// Imports one (object, source) pair: open/decompress/parse, run the schema-transform policy,
/// materialize InternalRecords, bucket them by destination. Always returns a [`SourceLog`]
/// (even on failure, for the audit record); the accompanying `Result` carries the buckets on
/// success or the first fatal error encountered.
pub async fn import(
    object_store: &dyn ObjectStore,
    policy: &dyn Policy,
    object: &Object,
    source: &Source,
) -> (SourceLog, Result<PerDestinationBuckets, IngestError>) {
    let started_at = Utc::now();
    let object_ref = object.store_ref.url();
    let mut log = SourceLog {
        object_ref: object_ref.clone(),
        parser: source.parser,
        schema_tag: source.schema_tag.clone(),
        compression: source.compression,
        row_count: 0,
        started_at,
        finished_at: started_at,
        success: false,
    };

    let result = import_inner(object_store, policy, object, source, &mut log).await;
    log.finished_at = Utc::now();
    log.success = result.is_ok();
    (log, result)
}

async fn import_inner(
    object_store: &dyn ObjectStore,
    policy: &dyn Policy,
    object: &Object,
    source: &Source,
    log: &mut SourceLog,
) -> Result<PerDestinationBuckets, IngestError> {
    let object_ref = object.store_ref.url();
    let bytes = download(object_store, object, source.compression).await?;
    let values = parse_json_stream(&object_ref, &bytes)?;

    let query = format!("schema.{}", source.schema_tag);
    let mut buckets: PerDestinationBuckets = BTreeMap::new();

    for value in values {
        log.row_count += 1;

        let decision = policy
            .evaluate(&query, value)
            .await
            .map_err(|e| IngestError::PolicyError {
                object_ref: object_ref.clone(),
                source: Box::new(e),
            })?;
        let rows = parse_decision(&object_ref, decision)?;

        if rows.is_empty() {
            warn!(object_ref = %object_ref, "schema policy produced no log rows, skipping record");
            continue;
        }

        for mut row in rows {
            row.validate_for(&object_ref)?;

            let cleaned = clean(&row.data);
            let id = row.id.clone().unwrap_or_else(|| stable_content_hash(&cleaned));

            let record = InternalRecord {
                id,
                ingest_id: String::new(), // filled in by the coordinator once a destination task starts
                timestamp: unix_seconds_to_instant(row.timestamp),
                ingested_at: Utc::now(),
                data: cleaned,
            };

            buckets.entry(row.destination).or_default().push(record);
        }
    }

    Ok(buckets)
}
