use serde_json::Deserializer;
use swarm_types::IngestError;

/// Parses a stream of whitespace/newline-delimited JSON values out of `bytes` (spec §4.5 step
/// 2: "consume a stream of JSON values from the reader").
pub fn parse_json_stream(object_ref: &str, bytes: &[u8]) -> Result<Vec<serde_json::Value>, IngestError> {
    let stream = Deserializer::from_slice(bytes).into_iter::<serde_json::Value>();
    stream
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| IngestError::SourceParse {
            object_ref: object_ref.to_string(),
            source: Box::new(e),
        })
}
