use sha2::{Digest, Sha256};

use crate::value::Value;

/// Derives a stable content hash for an already-cleaned `Value`, used as `InternalRecord::id`
/// when a `LogRow`'s policy output omits one. Must be a pure function of `data` alone so that two
/// `import` runs on identical input produce the same id (spec §8 invariant).
///
/// Operates on a canonical textual rendering of the value tree rather than `serde_json`
/// serialization directly, so that key ordering (already canonical via `BTreeMap`) and variant
/// tagging stay stable across crate versions.
pub fn stable_content_hash(data: &Value) -> String {
    let mut hasher = Sha256::new();
    hash_value(&mut hasher, data);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn hash_value(hasher: &mut Sha256, v: &Value) {
    match v {
        Value::Null => hasher.update(b"n"),
        Value::Bool(b) => {
            hasher.update(b"b");
            hasher.update([*b as u8]);
        }
        Value::Int(i) => {
            hasher.update(b"i");
            hasher.update(i.to_le_bytes());
        }
        Value::Float(f) => {
            hasher.update(b"f");
            hasher.update(f.to_le_bytes());
        }
        Value::String(s) => {
            hasher.update(b"s");
            hasher.update((s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
        Value::Bytes(b) => {
            hasher.update(b"y");
            hasher.update((b.len() as u64).to_le_bytes());
            hasher.update(b);
        }
        Value::Array(a) => {
            hasher.update(b"a");
            hasher.update((a.len() as u64).to_le_bytes());
            for item in a {
                hash_value(hasher, item);
            }
        }
        Value::Object(m) => {
            hasher.update(b"o");
            hasher.update((m.len() as u64).to_le_bytes());
            for (k, val) in m {
                hasher.update((k.len() as u64).to_le_bytes());
                hasher.update(k.as_bytes());
                hash_value(hasher, val);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn stable_across_calls() {
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), Value::Int(1));
        let v = Value::Object(m);
        assert_eq!(stable_content_hash(&v), stable_content_hash(&v));
    }

    #[test]
    fn distinguishes_array_from_bytes() {
        let arr = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        let bytes = Value::Bytes(vec![1, 2]);
        assert_ne!(stable_content_hash(&arr), stable_content_hash(&bytes));
    }
}
