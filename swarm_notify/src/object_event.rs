use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use swarm_types::{Digest, Object, StoreRef};

fn from_naive_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(naive.timestamp(), naive.timestamp_subsec_nanos())
        .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
}

/// One object-change notification, e.g. a GCS object-finalize event (spec §4.8). `size` and
/// `timeCreated` arrive as strings on the wire; both are best-effort parsed and simply omitted
/// from the resulting `Object` when malformed, mirroring `CloudStorageEvent::ToObject()`.
#[derive(Debug, Deserialize)]
pub struct ObjectEvent {
    pub bucket: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default, rename = "md5Hash")]
    pub md5_hash: Option<String>,
    #[serde(default, rename = "timeCreated")]
    pub time_created: Option<String>,
}

const TIME_CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

impl ObjectEvent {
    pub fn into_object(self) -> Object {
        let store_ref = StoreRef::new(self.bucket, self.name);
        let mut object = Object::new(store_ref, Vec::new());

        object.size = self.size.as_deref().and_then(|s| s.parse::<u64>().ok());

        object.created_at = self.time_created.as_deref().and_then(|s| {
            NaiveDateTime::parse_from_str(s, TIME_CREATED_FORMAT)
                .ok()
                .map(from_naive_utc)
        });

        if let Some(hash) = self.md5_hash.as_deref() {
            if let Ok(raw) = base64::decode(hash) {
                let value = raw.iter().map(|b| format!("{b:02x}")).collect::<String>();
                object.digests.push(Digest {
                    alg: "md5".to_string(),
                    value,
                });
            }
        }

        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_size_and_digest_and_timestamp() {
        let raw = serde_json::json!({
            "bucket": "b",
            "name": "n",
            "size": "1024",
            "md5Hash": base64::encode([0xde, 0xad, 0xbe, 0xef]),
            "timeCreated": "2024-01-02T03:04:05.000Z",
        });
        let event: ObjectEvent = serde_json::from_value(raw).unwrap();
        let object = event.into_object();

        assert_eq!(object.store_ref.bucket, "b");
        assert_eq!(object.store_ref.name, "n");
        assert_eq!(object.size, Some(1024));
        assert_eq!(object.digests.len(), 1);
        assert_eq!(object.digests[0].alg, "md5");
        assert_eq!(object.digests[0].value, "deadbeef");
        assert!(object.created_at.is_some());
    }

    #[test]
    fn tolerates_unparseable_fields() {
        let raw = serde_json::json!({
            "bucket": "b",
            "name": "n",
            "size": "not-a-number",
            "md5Hash": "not-base64!!",
            "timeCreated": "not-a-time",
        });
        let event: ObjectEvent = serde_json::from_value(raw).unwrap();
        let object = event.into_object();

        assert_eq!(object.size, None);
        assert!(object.digests.is_empty());
        assert_eq!(object.created_at, None);
    }
}
