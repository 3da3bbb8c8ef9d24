//! Schema inference, merge and equality (C1), and the record cleaner (C2).

mod clean;
mod infer;
mod json;
mod schema;

pub use clean::clean;
pub use infer::infer;
pub use json::schema_to_json;
pub use schema::{equal, merge, Field, FieldType, Mode, Schema};
