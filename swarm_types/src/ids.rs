use std::fmt;

/// Unique identifier assigned to one inbound HTTP/pull request.
///
/// Threaded through `tracing` spans the way `original_source`'s `utils.CtxRequestID` threads a
/// request ID through `context.Context`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

/// Unique identifier assigned to one destination-level ingest within a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IngestId(String);

macro_rules! uuid_id {
    ($ty:ident) => {
        impl $ty {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

uuid_id!(RequestId);
uuid_id!(IngestId);
