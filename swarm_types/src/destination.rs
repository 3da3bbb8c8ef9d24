/// Time-partitioning granularity applied to a warehouse table's `timestamp` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionUnit {
    None,
    Day,
    Month,
}

/// `(dataset, table, partition_unit)`. Equality defines routing: rows sharing a key share a
/// schema and a writer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Destination {
    pub dataset: String,
    pub table: String,
    pub partition_unit: PartitionUnit,
}

impl Destination {
    pub fn new(
        dataset: impl Into<String>,
        table: impl Into<String>,
        partition_unit: PartitionUnit,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
            partition_unit,
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}
