use swarm_types::{IngestError, Value};

use crate::schema::{Field, FieldType, Mode, Schema};

/// Recursively derives a table schema from a record's top-level mapping. Mappings become
/// `record` fields; sequences become `repeated`; scalars map to their obvious type; empty
/// mappings/sequences yield a field of mode `nullable` with unknown child type, which [`crate::merge`]
/// accepts against any type.
pub fn infer(value: &Value) -> Result<Schema, IngestError> {
    let object = value.as_object().ok_or_else(|| IngestError::Assertion {
        message: "infer() requires an Object at the top level".to_string(),
    })?;

    let mut fields = Vec::with_capacity(object.len());
    for (name, v) in object {
        fields.push(infer_field(name, v)?);
    }
    Ok(Schema(fields))
}

fn infer_field(name: &str, value: &Value) -> Result<Field, IngestError> {
    Ok(match value {
        Value::Null => Field {
            name: name.to_string(),
            field_type: None,
            mode: Mode::Nullable,
            children: None,
        },
        Value::Bool(_) => scalar(name, FieldType::Bool, Mode::Required),
        Value::Int(_) => scalar(name, FieldType::Int, Mode::Required),
        Value::Float(_) => scalar(name, FieldType::Float, Mode::Required),
        Value::String(_) => scalar(name, FieldType::String, Mode::Required),
        Value::Bytes(_) => scalar(name, FieldType::Bytes, Mode::Required),
        Value::Object(m) => {
            if m.is_empty() {
                Field {
                    name: name.to_string(),
                    field_type: None,
                    mode: Mode::Nullable,
                    children: None,
                }
            } else {
                let mut children = Vec::with_capacity(m.len());
                for (child_name, child_value) in m {
                    children.push(infer_field(child_name, child_value)?);
                }
                Field {
                    name: name.to_string(),
                    field_type: Some(FieldType::Record),
                    mode: Mode::Required,
                    children: Some(children),
                }
            }
        }
        Value::Array(items) => infer_array_field(name, items)?,
    })
}

fn infer_array_field(name: &str, items: &[Value]) -> Result<Field, IngestError> {
    if items.is_empty() {
        return Ok(Field {
            name: name.to_string(),
            field_type: None,
            mode: Mode::Nullable,
            children: None,
        });
    }

    // Infer each non-null element as its own one-field record so the existing field-merge
    // logic (type/children agreement) does the work of unifying element shapes; `Null` holes
    // contribute nothing, matching the "arrays preserve arity, null holes allowed" boundary.
    let mut merged: Option<Field> = None;
    for item in items {
        if item.is_null() {
            continue;
        }
        let element_field = infer_field(name, item)?;
        merged = Some(match merged {
            None => element_field,
            Some(existing) => crate::schema::merge(
                &Schema(vec![existing]),
                &Schema(vec![element_field]),
            )?
            .0
            .into_iter()
            .next()
            .expect("single-field schema merge yields a single field"),
        });
    }

    Ok(match merged {
        Some(mut field) => {
            field.mode = Mode::Repeated;
            field
        }
        None => Field {
            name: name.to_string(),
            field_type: None,
            mode: Mode::Nullable,
            children: None,
        },
    })
}

fn scalar(name: &str, field_type: FieldType, mode: Mode) -> Field {
    Field {
        name: name.to_string(),
        field_type: Some(field_type),
        mode,
        children: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        let mut m = BTreeMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        Value::Object(m)
    }

    #[test]
    fn infers_scalars() {
        let v = obj(vec![
            ("a", Value::Int(1)),
            ("b", Value::String("x".to_string())),
        ]);
        let schema = infer(&v).unwrap();
        assert_eq!(schema.fields().len(), 2);
    }

    #[test]
    fn infers_nested_record() {
        let v = obj(vec![("a", obj(vec![("b", Value::Int(1))]))]);
        let schema = infer(&v).unwrap();
        let f = &schema.fields()[0];
        assert_eq!(f.field_type, Some(FieldType::Record));
        assert!(f.children.is_some());
    }

    #[test]
    fn infers_repeated_scalar() {
        let v = obj(vec![(
            "a",
            Value::Array(vec![Value::Int(1), Value::Null, Value::Int(2)]),
        )]);
        let schema = infer(&v).unwrap();
        let f = &schema.fields()[0];
        assert_eq!(f.mode, Mode::Repeated);
        assert_eq!(f.field_type, Some(FieldType::Int));
    }

    #[test]
    fn empty_array_is_nullable_unknown() {
        let v = obj(vec![("a", Value::Array(vec![]))]);
        let schema = infer(&v).unwrap();
        let f = &schema.fields()[0];
        assert_eq!(f.mode, Mode::Nullable);
        assert_eq!(f.field_type, None);
    }
}
