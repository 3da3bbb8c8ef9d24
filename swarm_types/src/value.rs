use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

/// A dynamically-typed tree of data.
///
/// Records arriving from an object-store object are untyped JSON; the schema engine, the
/// record cleaner, and the warehouse's JSON-to-proto transcoder all walk this same sum type
/// rather than `serde_json::Value` directly, so that a `Bytes` variant (not representable in
/// JSON) can be threaded through alongside values that genuinely came from JSON.
///
/// `Value` deliberately does not derive `serde::Serialize`/`Deserialize`: every boundary that
/// needs wire representation goes through `serde_json::Value` via the `From` impls below, which
/// keeps the `Bytes` variant (ambiguous with `Array` on the wire) from ever being guessed at by
/// a derived (de)serializer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    // Fall back to float; NaN/Infinity never appear in valid JSON numbers.
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(a) => Value::Array(a.into_iter().map(Value::from).collect()),
            JsonValue::Object(m) => {
                Value::Object(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for JsonValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Int(i) => JsonValue::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s),
            // Bytes have no native JSON representation; callers that need proto encoding
            // consume `Value` directly and never round-trip this variant through JSON.
            Value::Bytes(b) => JsonValue::String(base64::encode(&b)),
            Value::Array(a) => JsonValue::Array(a.into_iter().map(JsonValue::from).collect()),
            Value::Object(m) => {
                JsonValue::Object(m.into_iter().map(|(k, v)| (k, JsonValue::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_preserves_shape() {
        let src = serde_json::json!({
            "a": 1,
            "b": [1, 2, null],
            "c": {"d": "e"},
            "f": 1.5,
        });
        let v: Value = src.clone().into();
        let back: JsonValue = v.into();
        assert_eq!(src, back);
    }
}
