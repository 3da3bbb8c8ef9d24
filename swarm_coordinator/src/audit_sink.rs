use std::collections::BTreeMap;

use observability_deps::tracing::warn;
use swarm_capabilities::Warehouse;
use swarm_schema::{Field, FieldType, Mode, Schema};
use swarm_types::{Destination, PartitionUnit, Value};

use crate::audit::{AuditRecord, IngestLog};

/// Destination the Audit Log Sink writes to, when configured (spec §4.9: "If an audit
/// destination (dataset+table) is configured..."). Partitioned by month on `started_at`.
pub fn audit_destination(dataset: impl Into<String>, table: impl Into<String>) -> Destination {
    Destination::new(dataset, table, PartitionUnit::Month)
}

/// The fixed schema for one audit record. Unlike the data pipeline's tables, this schema is
/// never inferred -- its shape is the `Ingest audit record` from spec §3 -- so the Table
/// Manager reconciles it once, typically at start-up.
pub fn audit_schema() -> Schema {
    Schema(vec![
        required("request_id", FieldType::String),
        required("started_at", FieldType::Timestamp),
        required("finished_at", FieldType::Timestamp),
        required("success", FieldType::Bool),
        nullable("error", FieldType::String),
        repeated_record("sources", source_log_fields()),
        repeated_record("ingests", ingest_log_fields()),
    ])
}

fn source_log_fields() -> Vec<Field> {
    vec![
        required("object_ref", FieldType::String),
        required("parser", FieldType::String),
        required("schema_tag", FieldType::String),
        required("compression", FieldType::String),
        required("row_count", FieldType::Int),
        required("started_at", FieldType::Timestamp),
        required("finished_at", FieldType::Timestamp),
        required("success", FieldType::Bool),
    ]
}

fn ingest_log_fields() -> Vec<Field> {
    vec![
        required("ingest_id", FieldType::String),
        required("dataset", FieldType::String),
        required("table", FieldType::String),
        required("row_count", FieldType::Int),
        required("table_schema_json", FieldType::String),
        required("started_at", FieldType::Timestamp),
        required("finished_at", FieldType::Timestamp),
        required("success", FieldType::Bool),
        nullable("error", FieldType::String),
    ]
}

fn required(name: &str, field_type: FieldType) -> Field {
    Field {
        name: name.to_string(),
        field_type: Some(field_type),
        mode: Mode::Required,
        children: None,
    }
}

fn nullable(name: &str, field_type: FieldType) -> Field {
    Field {
        name: name.to_string(),
        field_type: Some(field_type),
        mode: Mode::Nullable,
        children: None,
    }
}

fn repeated_record(name: &str, children: Vec<Field>) -> Field {
    Field {
        name: name.to_string(),
        field_type: Some(FieldType::Record),
        mode: Mode::Repeated,
        children: Some(children),
    }
}

/// Renders an `AuditRecord` into the `Value` tree the Streaming Writer encodes against
/// [`audit_schema`].
pub fn audit_record_to_value(record: &AuditRecord) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("request_id".to_string(), Value::String(record.request_id.clone()));
    fields.insert("started_at".to_string(), Value::Int(micros(record.started_at)));
    fields.insert("finished_at".to_string(), Value::Int(micros(record.finished_at)));
    fields.insert("success".to_string(), Value::Bool(record.success));
    fields.insert(
        "error".to_string(),
        record.error.clone().map(Value::String).unwrap_or(Value::Null),
    );
    fields.insert(
        "sources".to_string(),
        Value::Array(record.sources.iter().map(source_log_to_value).collect()),
    );
    fields.insert(
        "ingests".to_string(),
        Value::Array(record.ingests.iter().map(ingest_log_to_value).collect()),
    );
    Value::Object(fields)
}

fn source_log_to_value(log: &swarm_importer::SourceLog) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("object_ref".to_string(), Value::String(log.object_ref.clone()));
    fields.insert("parser".to_string(), Value::String(parser_name(log.parser).to_string()));
    fields.insert("schema_tag".to_string(), Value::String(log.schema_tag.clone()));
    fields.insert(
        "compression".to_string(),
        Value::String(compression_name(log.compression).to_string()),
    );
    fields.insert("row_count".to_string(), Value::Int(log.row_count as i64));
    fields.insert("started_at".to_string(), Value::Int(micros(log.started_at)));
    fields.insert("finished_at".to_string(), Value::Int(micros(log.finished_at)));
    fields.insert("success".to_string(), Value::Bool(log.success));
    Value::Object(fields)
}

fn ingest_log_to_value(log: &IngestLog) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("ingest_id".to_string(), Value::String(log.ingest_id.clone()));
    fields.insert("dataset".to_string(), Value::String(log.dataset.clone()));
    fields.insert("table".to_string(), Value::String(log.table.clone()));
    fields.insert("row_count".to_string(), Value::Int(log.row_count as i64));
    fields.insert(
        "table_schema_json".to_string(),
        Value::String(log.table_schema_json.clone()),
    );
    fields.insert("started_at".to_string(), Value::Int(micros(log.started_at)));
    fields.insert("finished_at".to_string(), Value::Int(micros(log.finished_at)));
    fields.insert("success".to_string(), Value::Bool(log.success));
    fields.insert(
        "error".to_string(),
        log.error.clone().map(Value::String).unwrap_or(Value::Null),
    );
    Value::Object(fields)
}

fn parser_name(parser: swarm_types::Parser) -> &'static str {
    match parser {
        swarm_types::Parser::Json => "json",
    }
}

fn compression_name(compression: swarm_types::Compression) -> &'static str {
    match compression {
        swarm_types::Compression::None => "none",
        swarm_types::Compression::Gzip => "gzip",
    }
}

fn micros(instant: chrono::DateTime<chrono::Utc>) -> i64 {
    instant.timestamp() * 1_000_000 + instant.timestamp_subsec_micros() as i64
}

/// Writes one audit row for `record` to `destination`. Per spec §4.9 the audit write's own
/// failure is logged, never propagated -- the data ingest's result must not be masked by an
/// audit-pipeline failure.
pub async fn write_audit_record(
    warehouse: &dyn Warehouse,
    destination: &Destination,
    record: &AuditRecord,
    record_concurrency: usize,
) {
    let schema = audit_schema();
    let value = audit_record_to_value(record);
    let values = [value];

    let result = swarm_warehouse::write_records(warehouse, destination, &values, record_concurrency, || {
        let schema = schema.clone();
        async move { swarm_warehouse::reconcile(warehouse, destination, &schema).await.map(|m| m.schema) }
    })
    .await;

    if let Err(err) = result {
        warn!(request_id = %record.request_id, error = %err, "failed to write audit record");
    }
}
