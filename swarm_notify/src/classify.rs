use serde::Deserialize;
use swarm_capabilities::Policy;
use swarm_coordinator::LoadRequest;
use swarm_types::{Compression, IngestError, Object, Parser, Source};

/// Wire shape of a `source` policy decision: zero or more classified decoding recipes for one
/// Object, mirroring `original_source`'s `model.EventPolicyOutput{Sources []*Source}`.
#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    sources: Vec<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    parser: RawParser,
    schema_tag: String,
    #[serde(default)]
    compression: RawCompression,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawParser {
    Json,
}

impl From<RawParser> for Parser {
    fn from(v: RawParser) -> Self {
        match v {
            RawParser::Json => Parser::Json,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum RawCompression {
    #[default]
    None,
    Gzip,
}

impl From<RawCompression> for Compression {
    fn from(v: RawCompression) -> Self {
        match v {
            RawCompression::None => Compression::None,
            RawCompression::Gzip => Compression::Gzip,
        }
    }
}

/// Classifies one Object into zero-or-more Sources via the policy capability (spec §4.8),
/// emitting one `LoadRequest` per (object, source) pair. Zero sources is a configuration
/// failure (`PolicyMissing`), matching `ObjectToSources`'s error path in the original.
pub async fn object_to_load_requests(
    policy: &dyn Policy,
    object: Object,
) -> Result<Vec<LoadRequest>, IngestError> {
    let object_ref = object.store_ref.url();
    let input: serde_json::Value = serde_json::json!({
        "store_ref": {"bucket": object.store_ref.bucket, "name": object.store_ref.name},
        "size": object.size,
        "created_at": object.created_at.map(|t| t.timestamp()),
    });

    let decision = policy
        .evaluate("source", input)
        .await
        .map_err(|e| IngestError::PolicyError {
            object_ref: object_ref.clone(),
            source: Box::new(e),
        })?;

    let raw: RawDecision =
        serde_json::from_value(decision).map_err(|e| IngestError::PolicyInvalid {
            object_ref: object_ref.clone(),
            message: e.to_string(),
        })?;

    if raw.sources.is_empty() {
        return Err(IngestError::PolicyMissing { object_ref });
    }

    Ok(raw
        .sources
        .into_iter()
        .map(|s| LoadRequest {
            object: object.clone(),
            source: Source::new(Parser::from(s.parser), s.schema_tag, Compression::from(s.compression)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_capabilities::testing::StaticPolicy;
    use swarm_types::StoreRef;

    #[tokio::test]
    async fn emits_one_request_per_source() {
        let policy = StaticPolicy::new();
        policy.set(
            "source",
            serde_json::json!({"sources": [
                {"parser": "json", "schema_tag": "cloudtrail", "compression": "none"},
                {"parser": "json", "schema_tag": "vpc_flow", "compression": "gzip"},
            ]}),
        );

        let object = Object::new(StoreRef::new("bucket", "obj.json"), Vec::new());
        let requests = object_to_load_requests(&policy, object).await.unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].source.schema_tag, "cloudtrail");
        assert_eq!(requests[1].source.compression, Compression::Gzip);
    }

    #[tokio::test]
    async fn errors_when_no_sources_matched() {
        let policy = StaticPolicy::new();
        policy.set("source", serde_json::json!({"sources": []}));

        let object = Object::new(StoreRef::new("bucket", "obj.json"), Vec::new());
        let err = object_to_load_requests(&policy, object).await.unwrap_err();
        assert!(matches!(err, IngestError::PolicyMissing { .. }));
    }
}
