use serde::Deserialize;
use swarm_types::{Digest, Object, StoreRef};

/// The abstract, already-classified event shape a same-system publisher sends directly (spec
/// §4.8's "batched abstract event"), one message carrying many Objects.
#[derive(Debug, Deserialize)]
pub struct BatchedEvent {
    pub objects: Vec<ObjectDto>,
}

/// Wire form of `swarm_types::Object`, matching the glossary shape
/// `{ store_ref: {bucket, name}, size?, created_at?, digests[{alg,value}] }`.
#[derive(Debug, Deserialize)]
pub struct ObjectDto {
    pub store_ref: StoreRefDto,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub digests: Vec<DigestDto>,
}

#[derive(Debug, Deserialize)]
pub struct StoreRefDto {
    pub bucket: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DigestDto {
    pub alg: String,
    pub value: String,
}

impl ObjectDto {
    pub fn into_object(self) -> Object {
        let store_ref = StoreRef::new(self.store_ref.bucket, self.store_ref.name);
        let mut object = Object::new(store_ref, Vec::new());
        object.size = self.size;
        object.created_at = self
            .created_at
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));
        object.digests = self
            .digests
            .into_iter()
            .map(|d| Digest {
                alg: d.alg,
                value: d.value,
            })
            .collect();
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_batch_of_abstract_objects() {
        let raw = serde_json::json!({
            "objects": [
                {"store_ref": {"bucket": "b", "name": "n1"}, "size": 10},
                {"store_ref": {"bucket": "b", "name": "n2"}, "digests": [{"alg": "md5", "value": "abc"}]},
            ]
        });
        let batch: BatchedEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(batch.objects.len(), 2);

        let first = batch.objects.into_iter().next().unwrap().into_object();
        assert_eq!(first.store_ref.name, "n1");
        assert_eq!(first.size, Some(10));
    }
}
