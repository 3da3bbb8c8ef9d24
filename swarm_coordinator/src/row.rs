use swarm_types::{InternalRecord, Value};

/// Flattens an `InternalRecord` into the `Value` the Streaming Writer encodes: the four fixed
/// system columns (`id`, `ingest_id`, `timestamp`, `ingested_at`) sit alongside `data`'s own
/// top-level fields in one object, matching the column layout `Schema::with_record_metadata`
/// prepends ahead of the inferred data schema.
pub fn materialize_row(record: &InternalRecord) -> Value {
    let mut fields = match &record.data {
        Value::Object(m) => m.clone(),
        // `data` is validated non-empty/non-null upstream (LogRow::validate); an unexpected
        // shape here just contributes no extra columns.
        _ => Default::default(),
    };
    fields.insert("id".to_string(), Value::String(record.id.clone()));
    fields.insert("ingest_id".to_string(), Value::String(record.ingest_id.clone()));
    fields.insert("timestamp".to_string(), Value::Int(micros(record.timestamp)));
    fields.insert("ingested_at".to_string(), Value::Int(micros(record.ingested_at)));
    Value::Object(fields)
}

fn micros(instant: chrono::DateTime<chrono::Utc>) -> i64 {
    instant.timestamp() * 1_000_000 + instant.timestamp_subsec_micros() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use chrono::Utc;

    #[test]
    fn merges_system_columns_with_data_fields() {
        let mut data = BTreeMap::new();
        data.insert("a".to_string(), Value::Int(1));
        let record = InternalRecord {
            id: "rid".to_string(),
            ingest_id: "iid".to_string(),
            timestamp: Utc::now(),
            ingested_at: Utc::now(),
            data: Value::Object(data),
        };

        let row = materialize_row(&record);
        let object = row.as_object().unwrap();
        assert_eq!(object.get("id"), Some(&Value::String("rid".to_string())));
        assert_eq!(object.get("ingest_id"), Some(&Value::String("iid".to_string())));
        assert_eq!(object.get("a"), Some(&Value::Int(1)));
        assert!(object.contains_key("timestamp"));
        assert!(object.contains_key("ingested_at"));
    }
}
