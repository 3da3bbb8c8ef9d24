use observability_deps::tracing::info;
use swarm_capabilities::Warehouse;
use swarm_types::{Destination, IngestError, PartitionUnit};
use swarm_warehouse::reconcile;

/// Copies a table's schema onto a new or existing destination, grounded in
/// `original_source/pkg/usecase/migrate.go`'s `migrateTable`. That original also executes a
/// templated `INSERT ... SELECT` query to copy the row data itself; the `Warehouse` capability
/// here exposes no query-execution method (spec §1 scopes the warehouse SDK down to
/// metadata/append/stream), so this subcommand only reconciles the schema side.
pub struct MigrateArgs {
    pub source: Destination,
    pub destination: Destination,
}

pub async fn run(warehouse: &dyn Warehouse, args: MigrateArgs) -> Result<(), IngestError> {
    let source_metadata = warehouse
        .get_metadata(&args.source)
        .await?
        .ok_or_else(|| IngestError::TableNotFound {
            dataset: args.source.dataset.clone(),
            table: args.source.table.clone(),
        })?;

    info!(src = %args.source, dst = %args.destination, "migrating table schema");
    let committed = reconcile(warehouse, &args.destination, &source_metadata.schema).await?;
    info!(dst = %args.destination, etag = %committed.etag, "migration complete");
    Ok(())
}

/// Parses a `<dataset>.<table>[.<partition>]` table reference, mirroring the original's
/// `parseBigQueryTableID` minus the project segment (this workspace's `Destination` has no
/// project field; the warehouse client is already scoped to one project at construction time).
pub fn parse_table_ref(raw: &str, partition_unit: PartitionUnit) -> Result<Destination, IngestError> {
    let mut parts = raw.splitn(2, '.');
    let dataset = parts.next().filter(|s| !s.is_empty());
    let table = parts.next().filter(|s| !s.is_empty());
    match (dataset, table) {
        (Some(dataset), Some(table)) => Ok(Destination::new(dataset, table, partition_unit)),
        _ => Err(IngestError::ConfigInvalid {
            message: format!("invalid table reference {raw:?}, expected <dataset>.<table>"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_capabilities::testing::MemoryWarehouse;
    use swarm_schema::infer;
    use swarm_types::Value;
    use std::collections::BTreeMap;

    fn record() -> Value {
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), Value::Int(1));
        Value::Object(m)
    }

    #[test]
    fn parses_valid_table_ref() {
        let dest = parse_table_ref("ds.tbl", PartitionUnit::Day).unwrap();
        assert_eq!(dest.dataset, "ds");
        assert_eq!(dest.table, "tbl");
    }

    #[test]
    fn rejects_table_ref_without_dot() {
        assert!(parse_table_ref("ds", PartitionUnit::Day).is_err());
    }

    #[tokio::test]
    async fn errors_when_source_table_missing() {
        let warehouse = MemoryWarehouse::new();
        let args = MigrateArgs {
            source: Destination::new("ds", "src", PartitionUnit::Day),
            destination: Destination::new("ds", "dst", PartitionUnit::Day),
        };
        let err = run(&warehouse, args).await.unwrap_err();
        assert!(matches!(err, IngestError::TableNotFound { .. }));
    }

    #[tokio::test]
    async fn creates_destination_from_source_schema() {
        let warehouse = MemoryWarehouse::new();
        let source = Destination::new("ds", "src", PartitionUnit::Day);
        let schema = infer(&record()).unwrap();
        warehouse.create_table(&source, &schema).await.unwrap();

        let args = MigrateArgs {
            source: source.clone(),
            destination: Destination::new("ds", "dst", PartitionUnit::Day),
        };
        run(&warehouse, args).await.unwrap();

        let dst_metadata = warehouse
            .get_metadata(&Destination::new("ds", "dst", PartitionUnit::Day))
            .await
            .unwrap();
        assert!(dst_metadata.is_some());
    }
}
