//! Source Importer (C5): for one (object, source) pair, open/decompress/parse records, run the
//! schema-transform policy, and bucket materialized rows by destination.

mod decision;
mod download;
mod import;
mod parse;
mod source_log;

pub use import::{import, PerDestinationBuckets};
pub use source_log::SourceLog;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use swarm_capabilities::object_store::{ObjectStore, Path};
    use swarm_capabilities::testing::StaticPolicy;
    use swarm_types::{Compression, Object, Parser, Source, StoreRef};

    #[tokio::test]
    async fn imports_records_into_destination_bucket() {
        let store = swarm_capabilities::object_store::InMemory::new();
        let body = bytes::Bytes::from_static(b"{\"a\":1}\n{\"a\":2}\n");
        store.put(&Path::from("obj.json"), body).await.unwrap();
        let policy = StaticPolicy::new();
        policy.set(
            "schema.cloudtrail",
            json!({"logs": [{
                "destination": {"dataset": "ds", "table": "tbl", "partition_unit": "day"},
                "timestamp": 1700000000.0,
                "data": {"a": 1},
            }]}),
        );

        let object = Object::new(StoreRef::new("bucket", "obj.json"), Vec::new());
        let source = Source::new(Parser::Json, "cloudtrail", Compression::None);

        let (log, result) = import(&store, &policy, &object, &source).await;
        let buckets = result.unwrap();
        assert!(log.success);
        assert_eq!(log.row_count, 2);
        assert_eq!(buckets.len(), 1);
    }
}
