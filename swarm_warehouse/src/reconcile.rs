use observability_deps::tracing::{debug, info};
use swarm_capabilities::{TableMetadata, Warehouse};
use swarm_schema::{equal, merge, Schema};
use swarm_types::{Destination, IngestError};

/// Reconciles the inferred schema for one destination against the warehouse's current metadata
/// (spec §4.3, C3 Table Manager): create if absent, merge+update if evolved, no-op if equal.
/// Returns the committed schema and the warehouse's new etag.
pub async fn reconcile(
    warehouse: &dyn Warehouse,
    destination: &Destination,
    inferred: &Schema,
) -> Result<TableMetadata, IngestError> {
    match warehouse.get_metadata(destination).await? {
        None => {
            info!(%destination, "creating table");
            warehouse.create_table(destination, inferred).await
        }
        Some(current) => {
            if equal(&current.schema, inferred) {
                debug!(%destination, "schema unchanged, skipping update");
                return Ok(current);
            }
            let merged = merge(&current.schema, inferred)?;
            if equal(&current.schema, &merged) {
                // The inferred schema's new fields were all subsumed (e.g. `nullable` widening
                // that doesn't change the merged shape) -- nothing to update.
                return Ok(current);
            }
            info!(%destination, "schema evolved, updating table");
            warehouse
                .update_table(destination, &merged, &current.etag)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use swarm_capabilities::testing::MemoryWarehouse;
    use swarm_schema::{infer, Mode};
    use swarm_types::{PartitionUnit, Value};

    fn destination() -> Destination {
        Destination::new("ds", "tbl", PartitionUnit::Day)
    }

    fn record(pairs: Vec<(&str, Value)>) -> Value {
        let mut m = BTreeMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        Value::Object(m)
    }

    #[tokio::test]
    async fn creates_table_when_absent() {
        let warehouse = MemoryWarehouse::new();
        let schema = infer(&record(vec![("a", Value::Int(1))])).unwrap();
        let committed = reconcile(&warehouse, &destination(), &schema).await.unwrap();
        assert_eq!(committed.schema.fields().len(), 1);
    }

    #[tokio::test]
    async fn second_reconcile_with_same_schema_performs_no_update() {
        let warehouse = MemoryWarehouse::new();
        let schema = infer(&record(vec![("a", Value::Int(1))])).unwrap();
        let first = reconcile(&warehouse, &destination(), &schema).await.unwrap();
        let second = reconcile(&warehouse, &destination(), &schema).await.unwrap();
        assert_eq!(first.etag, second.etag);
    }

    #[tokio::test]
    async fn evolving_schema_triggers_exactly_one_update() {
        let warehouse = MemoryWarehouse::new();
        let v1 = record(vec![("a", Value::Int(1))]);
        let v2 = record(vec![("a", Value::Int(1)), ("b", Value::String("x".into()))]);
        let first = reconcile(&warehouse, &destination(), &infer(&v1).unwrap())
            .await
            .unwrap();
        let second = reconcile(&warehouse, &destination(), &infer(&v2).unwrap())
            .await
            .unwrap();
        assert_ne!(first.etag, second.etag);
        assert_eq!(second.schema.fields().len(), 2);
        let b_field = second
            .schema
            .fields()
            .iter()
            .find(|f| f.name == "b")
            .unwrap();
        assert_eq!(b_field.mode, Mode::Required);
    }
}
