use std::collections::BTreeMap;

use swarm_types::Value;

/// Produces a deep value-clone of `value` with all null leaves elided: null-valued mapping
/// entries are dropped, mappings and sequences that become empty solely as a result of that
/// pruning are dropped at their owning key, and non-empty arrays retain their arity (null
/// elements are kept as holes, not removed). Required because the schema engine cannot type a
/// field whose only observed value is null.
pub fn clean(value: &Value) -> Value {
    clean_inner(value).unwrap_or(Value::Null)
}

/// Returns `None` when `value` itself prunes away entirely (null, or an empty mapping/sequence
/// after pruning), so the caller (when recursing into a mapping) can drop the owning key.
fn clean_inner(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) | Value::Bytes(_) => {
            Some(value.clone())
        }
        Value::Array(items) => {
            if items.is_empty() {
                return None;
            }
            let cleaned: Vec<Value> = items
                .iter()
                .map(|item| clean_array_element(item))
                .collect();
            Some(Value::Array(cleaned))
        }
        Value::Object(map) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                if let Some(cv) = clean_inner(v) {
                    out.insert(k.clone(), cv);
                }
            }
            if out.is_empty() {
                None
            } else {
                Some(Value::Object(out))
            }
        }
    }
}

/// Array elements preserve arity: a null element stays `Null` rather than being dropped, and a
/// nested empty mapping/sequence element becomes `Null` rather than disappearing (which would
/// shift the indices of later elements).
fn clean_array_element(value: &Value) -> Value {
    clean_inner(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        let mut m = BTreeMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        Value::Object(m)
    }

    #[test]
    fn drops_null_leaves() {
        let v = obj(vec![("a", Value::Int(1)), ("b", Value::Null)]);
        let cleaned = clean(&v);
        assert_eq!(cleaned, obj(vec![("a", Value::Int(1))]));
    }

    #[test]
    fn drops_empty_mapping_after_pruning() {
        let v = obj(vec![
            ("a", obj(vec![("b", Value::Null)])),
            ("c", Value::Int(1)),
        ]);
        let cleaned = clean(&v);
        assert_eq!(cleaned, obj(vec![("c", Value::Int(1))]));
    }

    #[test]
    fn drops_empty_array_field() {
        let v = obj(vec![("a", Value::Array(vec![])), ("b", Value::Int(1))]);
        let cleaned = clean(&v);
        assert_eq!(cleaned, obj(vec![("b", Value::Int(1))]));
    }

    #[test]
    fn keeps_arity_for_array_with_null_elements() {
        let v = obj(vec![(
            "a",
            Value::Array(vec![Value::Int(1), Value::Null, Value::Int(2)]),
        )]);
        let cleaned = clean(&v);
        assert_eq!(
            cleaned,
            obj(vec![(
                "a",
                Value::Array(vec![Value::Int(1), Value::Null, Value::Int(2)])
            )])
        );
    }

    #[test]
    fn json_round_trip_is_idempotent() {
        let v = obj(vec![("a", Value::Int(1)), ("b", Value::Null)]);
        let once = clean(&v);
        let json: serde_json::Value = once.clone().into();
        let reparsed: Value = json.into();
        let twice = clean(&reparsed);
        assert_eq!(once, twice);
    }
}
