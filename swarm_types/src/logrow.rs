use crate::destination::Destination;
use crate::error::IngestError;
use crate::value::Value;

/// Output of the schema-transform policy: a typed row bound to a destination.
///
/// `id` is optional on input; the Source Importer derives it from the cleaned `data` via
/// [`crate::stable_content_hash`] when absent, so that re-running `import` on identical input
/// yields the same `InternalRecord::id`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub id: Option<String>,
    pub destination: Destination,
    pub timestamp: f64,
    pub data: Value,
}

impl LogRow {
    /// Checks the invariants from the data model: non-empty dataset/table, positive timestamp,
    /// non-empty data.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.destination.dataset.is_empty() || self.destination.table.is_empty() {
            return Err(IngestError::InvalidLogRow {
                object_ref: String::new(),
                message: "destination.dataset and destination.table must be non-empty".into(),
            });
        }
        if !(self.timestamp > 0.0) {
            return Err(IngestError::InvalidLogRow {
                object_ref: String::new(),
                message: format!("timestamp must be > 0, got {}", self.timestamp),
            });
        }
        let empty = match &self.data {
            Value::Object(m) => m.is_empty(),
            Value::Null => true,
            _ => false,
        };
        if empty {
            return Err(IngestError::InvalidLogRow {
                object_ref: String::new(),
                message: "data must be non-empty".into(),
            });
        }
        Ok(())
    }

    /// Re-raises a validation error with the object reference filled in, so callers don't have
    /// to know the field name used internally.
    pub fn validate_for(&self, object_ref: &str) -> Result<(), IngestError> {
        self.validate().map_err(|err| match err {
            IngestError::InvalidLogRow { message, .. } => IngestError::InvalidLogRow {
                object_ref: object_ref.to_string(),
                message,
            },
            other => other,
        })
    }
}
