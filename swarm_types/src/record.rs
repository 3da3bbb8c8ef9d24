use chrono::{DateTime, Utc};

use crate::value::Value;

/// Materialized row sent to the warehouse. Invariant: `data` contains no null leaves — callers
/// are expected to have run the data through the record cleaner before constructing one of
/// these.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalRecord {
    pub id: String,
    pub ingest_id: String,
    /// Sub-second precision, derived from `LogRow::timestamp` (unix seconds as `f64`).
    pub timestamp: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    pub data: Value,
}

/// Converts a `LogRow.timestamp` (unix seconds, possibly fractional) into an instant, preserving
/// sub-second precision.
pub fn unix_seconds_to_instant(seconds: f64) -> DateTime<Utc> {
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds.fract()) * 1_000_000_000.0).round() as u32;
    DateTime::from_timestamp(whole, nanos).unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_sub_second_precision() {
        let instant = unix_seconds_to_instant(1_700_000_000.25);
        assert_eq!(instant.timestamp(), 1_700_000_000);
        assert_eq!(instant.timestamp_subsec_nanos(), 250_000_000);
    }
}
