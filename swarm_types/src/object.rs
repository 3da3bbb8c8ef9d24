use chrono::{DateTime, Utc};

/// Location of an immutable blob in the object store: `(bucket, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreRef {
    pub bucket: String,
    pub name: String,
}

impl StoreRef {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
        }
    }

    /// `gs://<bucket>/<name>`, used for logging and error context (spec §6 "Object URL").
    pub fn url(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.name)
    }
}

impl std::fmt::Display for StoreRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url())
    }
}

/// A content digest attached to an object (e.g. `{alg: "md5", value: hex-encoded}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub alg: String,
    pub value: String,
}

/// Abstract reference to an immutable blob, created on receipt of a notification and
/// destroyed at the end of the owning request.
///
/// `raw_notification` breaks the cycle noted in the design notes: the notification refers to
/// the Object for classification, and the Object carries the notification's raw bytes back for
/// the audit log, rather than the two types referring to each other.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub store_ref: StoreRef,
    pub size: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub digests: Vec<Digest>,
    pub raw_notification: Vec<u8>,
}

impl Object {
    pub fn new(store_ref: StoreRef, raw_notification: Vec<u8>) -> Self {
        Self {
            store_ref,
            size: None,
            created_at: None,
            digests: Vec::new(),
            raw_notification,
        }
    }
}
