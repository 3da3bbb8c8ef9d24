use serde::Deserialize;
use serde_json::Value as JsonValue;
use swarm_types::{Destination, IngestError, LogRow, PartitionUnit};

/// Wire shape of a `schema.{tag}` policy decision: a list of log rows bound to destinations,
/// mirroring `original_source`'s `model.SchemaPolicyOutput{Logs []*LogRow}`.
#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    logs: Vec<RawLogRow>,
}

#[derive(Debug, Deserialize)]
struct RawLogRow {
    #[serde(default)]
    id: Option<String>,
    destination: RawDestination,
    timestamp: f64,
    data: JsonValue,
}

#[derive(Debug, Deserialize)]
struct RawDestination {
    dataset: String,
    table: String,
    #[serde(default)]
    partition_unit: RawPartitionUnit,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum RawPartitionUnit {
    #[default]
    None,
    Day,
    Month,
}

impl From<RawPartitionUnit> for PartitionUnit {
    fn from(v: RawPartitionUnit) -> Self {
        match v {
            RawPartitionUnit::None => PartitionUnit::None,
            RawPartitionUnit::Day => PartitionUnit::Day,
            RawPartitionUnit::Month => PartitionUnit::Month,
        }
    }
}

/// Parses a `schema.{tag}` policy decision into the `LogRow`s it bound, for one input record.
pub fn parse_decision(object_ref: &str, decision: JsonValue) -> Result<Vec<LogRow>, IngestError> {
    let raw: RawDecision =
        serde_json::from_value(decision).map_err(|e| IngestError::PolicyInvalid {
            object_ref: object_ref.to_string(),
            message: e.to_string(),
        })?;

    Ok(raw
        .logs
        .into_iter()
        .map(|row| LogRow {
            id: row.id,
            destination: Destination::new(
                row.destination.dataset,
                row.destination.table,
                row.destination.partition_unit.into(),
            ),
            timestamp: row.timestamp,
            data: row.data.into(),
        })
        .collect())
}
