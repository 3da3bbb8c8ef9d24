use serde_json::{json, Value as JsonValue};

use crate::schema::{Field, FieldType, Mode, Schema};

/// Renders a `Schema` as the JSON document the Table Manager and Audit Log Sink attach to a
/// table's metadata (`table_schema_json` in the ingest audit record, spec §3). `Schema` itself
/// stays free of a `serde` derive, same as `swarm_types::Value`, so this is a manual walk rather
/// than a derived `Serialize` impl.
pub fn schema_to_json(schema: &Schema) -> JsonValue {
    JsonValue::Array(schema.fields().iter().map(field_to_json).collect())
}

fn field_to_json(field: &Field) -> JsonValue {
    let mut out = json!({
        "name": field.name,
        "type": field.field_type.map(type_name),
        "mode": mode_name(field.mode),
    });
    if let Some(children) = &field.children {
        out["fields"] = JsonValue::Array(children.iter().map(field_to_json).collect());
    }
    out
}

fn type_name(t: FieldType) -> &'static str {
    match t {
        FieldType::String => "string",
        FieldType::Int => "int",
        FieldType::Float => "float",
        FieldType::Bool => "bool",
        FieldType::Timestamp => "timestamp",
        FieldType::Record => "record",
        FieldType::Bytes => "bytes",
    }
}

fn mode_name(m: Mode) -> &'static str {
    match m {
        Mode::Nullable => "nullable",
        Mode::Required => "required",
        Mode::Repeated => "repeated",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_record_fields() {
        let schema = Schema(vec![Field {
            name: "a".to_string(),
            field_type: Some(FieldType::Record),
            mode: Mode::Required,
            children: Some(vec![Field {
                name: "b".to_string(),
                field_type: Some(FieldType::Int),
                mode: Mode::Required,
                children: None,
            }]),
        }]);
        let json = schema_to_json(&schema);
        assert_eq!(json[0]["name"], "a");
        assert_eq!(json[0]["fields"][0]["name"], "b");
    }
}
