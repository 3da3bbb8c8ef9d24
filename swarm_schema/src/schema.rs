use std::collections::BTreeMap;

use swarm_types::IngestError;

/// Scalar and structural types a `Field` can hold. `Timestamp` is never produced by
/// [`infer`] — it is reserved for the fixed system columns (`timestamp`, `ingested_at`) that
/// the coordinator prepends via [`Schema::with_record_metadata`] before handing the schema to
/// the Table Manager, since the untyped `Value` tree has no timestamp variant of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Timestamp,
    Record,
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Nullable,
    Required,
    Repeated,
}

/// One field of a [`Schema`]. `field_type: None` is the "unknown child type" case the spec
/// describes for fields derived from an empty mapping/sequence — always paired with
/// `mode: Nullable`, and accepted against any type on merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: Option<FieldType>,
    pub mode: Mode,
    pub children: Option<Vec<Field>>,
}

/// Ordered sequence of fields. Order is preserved for deterministic output (e.g. the order a
/// warehouse table's DDL lists columns in) but [`equal`] ignores it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema(pub Vec<Field>);

impl Schema {
    pub fn fields(&self) -> &[Field] {
        &self.0
    }

    fn by_name(&self) -> BTreeMap<&str, &Field> {
        self.0.iter().map(|f| (f.name.as_str(), f)).collect()
    }

    /// Prepends the fixed system columns every InternalRecord carries (`id`, `ingest_id`,
    /// `timestamp`, `ingested_at`) ahead of the inferred `data` schema. Called by the Table
    /// Manager before reconciling, not by [`infer`] itself.
    pub fn with_record_metadata(data_schema: Schema) -> Schema {
        let mut fields = vec![
            Field {
                name: "id".to_string(),
                field_type: Some(FieldType::String),
                mode: Mode::Required,
                children: None,
            },
            Field {
                name: "ingest_id".to_string(),
                field_type: Some(FieldType::String),
                mode: Mode::Required,
                children: None,
            },
            Field {
                name: "timestamp".to_string(),
                field_type: Some(FieldType::Timestamp),
                mode: Mode::Required,
                children: None,
            },
            Field {
                name: "ingested_at".to_string(),
                field_type: Some(FieldType::Timestamp),
                mode: Mode::Required,
                children: None,
            },
        ];
        fields.extend(data_schema.0);
        Schema(fields)
    }
}

/// Deep structural equality ignoring field insertion order (spec §4.1).
pub fn equal(a: &Schema, b: &Schema) -> bool {
    let am = a.by_name();
    let bm = b.by_name();
    if am.len() != bm.len() {
        return false;
    }
    am.iter().all(|(name, fa)| match bm.get(name) {
        Some(fb) => fields_equal(fa, fb),
        None => false,
    })
}

fn fields_equal(a: &Field, b: &Field) -> bool {
    if a.field_type != b.field_type || a.mode != b.mode {
        return false;
    }
    match (&a.children, &b.children) {
        (Some(ca), Some(cb)) => equal(&Schema(ca.clone()), &Schema(cb.clone())),
        (None, None) => true,
        _ => false,
    }
}

/// Field-wise union of two schemas by name (spec §4.1). Monotone: a successful merge accepts
/// records conforming to either input schema.
pub fn merge(a: &Schema, b: &Schema) -> Result<Schema, IngestError> {
    let am = a.by_name();
    let bm = b.by_name();
    let mut names: Vec<&str> = am.keys().chain(bm.keys()).copied().collect();
    names.sort_unstable();
    names.dedup();

    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let merged = match (am.get(name), bm.get(name)) {
            (Some(fa), Some(fb)) => merge_fields(fa, fb)?,
            (Some(fa), None) => (*fa).clone(),
            (None, Some(fb)) => (*fb).clone(),
            (None, None) => unreachable!(),
        };
        out.push(merged);
    }
    Ok(Schema(out))
}

fn merge_fields(a: &Field, b: &Field) -> Result<Field, IngestError> {
    let field_type = match (a.field_type, b.field_type) {
        (Some(t), None) | (None, Some(t)) => Some(t),
        (None, None) => None,
        (Some(ta), Some(tb)) if ta == tb => Some(ta),
        (Some(_), Some(_)) => {
            return Err(IngestError::SchemaConflict {
                field_path: a.name.clone(),
                message: "conflicting scalar types".to_string(),
            })
        }
    };

    let mode = merge_modes(&a.name, a.mode, b.mode)?;

    let children = match (&a.children, &b.children) {
        (Some(ca), Some(cb)) => Some(merge(&Schema(ca.clone()), &Schema(cb.clone()))?.0),
        (Some(c), None) | (None, Some(c)) => Some(c.clone()),
        (None, None) => None,
    };

    Ok(Field {
        name: a.name.clone(),
        field_type,
        mode,
        children,
    })
}

fn merge_modes(field_path: &str, a: Mode, b: Mode) -> Result<Mode, IngestError> {
    use Mode::*;
    Ok(match (a, b) {
        (Required, Required) => Required,
        (Repeated, Repeated) => Repeated,
        (Nullable, Nullable) => Nullable,
        (Required, Nullable) | (Nullable, Required) => Nullable,
        (Nullable, Repeated) | (Repeated, Nullable) => {
            return Err(IngestError::SchemaConflict {
                field_path: field_path.to_string(),
                message: "cannot merge a nullable scalar field with a repeated field".to_string(),
            })
        }
        (Required, Repeated) | (Repeated, Required) => {
            return Err(IngestError::SchemaConflict {
                field_path: field_path.to_string(),
                message: "cannot merge a required scalar field with a repeated field".to_string(),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(name: &str, t: FieldType, mode: Mode) -> Field {
        Field {
            name: name.to_string(),
            field_type: Some(t),
            mode,
            children: None,
        }
    }

    #[test]
    fn merge_is_commutative_for_equal_fields() {
        let a = Schema(vec![scalar("x", FieldType::Int, Mode::Required)]);
        let b = Schema(vec![
            scalar("x", FieldType::Int, Mode::Nullable),
            scalar("y", FieldType::String, Mode::Required),
        ]);
        let ab = merge(&a, &b).unwrap();
        let ba = merge(&b, &a).unwrap();
        assert!(equal(&ab, &ba));
    }

    #[test]
    fn merge_rejects_nullable_repeated_conflict() {
        let a = Schema(vec![scalar("x", FieldType::Int, Mode::Nullable)]);
        let b = Schema(vec![scalar("x", FieldType::Int, Mode::Repeated)]);
        assert!(merge(&a, &b).is_err());
    }

    #[test]
    fn merge_rejects_scalar_type_conflict() {
        let a = Schema(vec![scalar("x", FieldType::Int, Mode::Required)]);
        let b = Schema(vec![scalar("x", FieldType::String, Mode::Required)]);
        assert!(merge(&a, &b).is_err());
    }

    #[test]
    fn equal_ignores_field_order() {
        let a = Schema(vec![
            scalar("x", FieldType::Int, Mode::Required),
            scalar("y", FieldType::String, Mode::Required),
        ]);
        let b = Schema(vec![
            scalar("y", FieldType::String, Mode::Required),
            scalar("x", FieldType::Int, Mode::Required),
        ]);
        assert!(equal(&a, &b));
    }
}
