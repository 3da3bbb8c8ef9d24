use futures::TryStreamExt;
use observability_deps::tracing::info;
use serde_json::json;
use swarm_capabilities::object_store::{ObjectStore, Path};
use swarm_capabilities::Publisher;
use swarm_types::IngestError;

/// Backfill entry point: lists every object under a bucket/prefix and republishes it as
/// batched-abstract-event messages, grounded in `original_source/pkg/usecase/enqueue.go`'s
/// `Enqueue`. The Go original accepts several `gs://` URLs and flushes a batch whenever either
/// limit is hit; this keeps the same two-limit batching rule for one bucket/prefix per call.
pub struct EnqueueArgs {
    pub bucket: String,
    pub prefix: String,
    pub topic: String,
    pub count_limit: usize,
    pub size_limit_bytes: u64,
}

#[derive(Default)]
pub struct EnqueueSummary {
    pub object_count: u64,
    pub total_size: u64,
    pub batch_count: u64,
}

pub async fn run(
    object_store: &dyn ObjectStore,
    publisher: &dyn Publisher,
    args: EnqueueArgs,
) -> Result<EnqueueSummary, IngestError> {
    let prefix = Path::from(args.prefix.as_str());
    let mut listing = object_store
        .list(Some(&prefix))
        .await
        .map_err(|e| IngestError::SourceRead {
            object_ref: format!("gs://{}/{}", args.bucket, args.prefix),
            source: Box::new(e),
        })?;

    let mut summary = EnqueueSummary::default();
    let mut batch: Vec<serde_json::Value> = Vec::new();
    let mut batch_size: u64 = 0;

    while let Some(meta) = listing
        .try_next()
        .await
        .map_err(|e| IngestError::SourceRead {
            object_ref: format!("gs://{}/{}", args.bucket, args.prefix),
            source: Box::new(e),
        })?
    {
        let size = meta.size as u64;
        summary.object_count += 1;
        summary.total_size += size;

        if (batch_size + size > args.size_limit_bytes && !batch.is_empty())
            || batch.len() >= args.count_limit
        {
            flush(publisher, &args.topic, &mut batch, &mut summary).await?;
            batch_size = 0;
        }

        batch.push(json!({
            "store_ref": { "bucket": args.bucket, "name": meta.location.to_string() },
            "size": size,
        }));
        batch_size += size;
    }

    if !batch.is_empty() {
        flush(publisher, &args.topic, &mut batch, &mut summary).await?;
    }

    info!(
        object_count = summary.object_count,
        total_size = summary.total_size,
        batch_count = summary.batch_count,
        "enqueue complete"
    );
    Ok(summary)
}

async fn flush(
    publisher: &dyn Publisher,
    topic: &str,
    batch: &mut Vec<serde_json::Value>,
    summary: &mut EnqueueSummary,
) -> Result<(), IngestError> {
    let payload = json!({ "objects": batch }).to_string().into_bytes();
    publisher.publish(topic, payload).await?;
    summary.batch_count += 1;
    batch.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_capabilities::object_store::InMemory;
    use swarm_capabilities::testing::MemoryPubSub;

    async fn seed(store: &InMemory, names: &[(&str, &[u8])]) {
        for (name, data) in names {
            store
                .put(&Path::from(*name), bytes::Bytes::from(data.to_vec()))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn flushes_a_batch_once_count_limit_is_reached() {
        let store = InMemory::new();
        seed(&store, &[("a/1", b"x"), ("a/2", b"y"), ("a/3", b"z")]).await;
        let pubsub = MemoryPubSub::new();

        let args = EnqueueArgs {
            bucket: "b".into(),
            prefix: "a/".into(),
            topic: "t".into(),
            count_limit: 2,
            size_limit_bytes: 1024,
        };
        let summary = run(&store, &pubsub, args).await.unwrap();

        assert_eq!(summary.object_count, 3);
        assert_eq!(summary.batch_count, 2);
        assert_eq!(pubsub.len(), 2);
    }

    #[tokio::test]
    async fn flushes_a_batch_once_size_limit_is_reached() {
        let store = InMemory::new();
        seed(&store, &[("a/1", b"12345"), ("a/2", b"67890")]).await;
        let pubsub = MemoryPubSub::new();

        let args = EnqueueArgs {
            bucket: "b".into(),
            prefix: "a/".into(),
            topic: "t".into(),
            count_limit: 128,
            size_limit_bytes: 5,
        };
        let summary = run(&store, &pubsub, args).await.unwrap();

        assert_eq!(summary.object_count, 2);
        assert_eq!(summary.batch_count, 2);
    }

    #[tokio::test]
    async fn single_batch_when_under_both_limits() {
        let store = InMemory::new();
        seed(&store, &[("a/1", b"x"), ("a/2", b"y")]).await;
        let pubsub = MemoryPubSub::new();

        let args = EnqueueArgs {
            bucket: "b".into(),
            prefix: "a/".into(),
            topic: "t".into(),
            count_limit: 128,
            size_limit_bytes: 1024,
        };
        let summary = run(&store, &pubsub, args).await.unwrap();

        assert_eq!(summary.batch_count, 1);
        assert_eq!(pubsub.len(), 1);
    }
}
