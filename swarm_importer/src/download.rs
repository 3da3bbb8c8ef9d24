use std::io::Read;

use flate2::read::GzDecoder;
use swarm_capabilities::object_store::{ObjectStore, Path};
use swarm_types::{Compression, IngestError, Object};

/// Opens the object and returns its decompressed bytes. Mirrors
/// `original_source/pkg/usecase/load.go`'s `downloadCloudStorageObject`, minus the JSON
/// decoding step (done separately so gzip failures and parse failures map to distinct error
/// kinds).
pub async fn download(
    object_store: &dyn ObjectStore,
    object: &Object,
    compression: Compression,
) -> Result<Vec<u8>, IngestError> {
    let path = Path::from(object.store_ref.name.as_str());
    let get_result = object_store.get(&path).await.map_err(|e| IngestError::SourceRead {
        object_ref: object.store_ref.url(),
        source: Box::new(e),
    })?;
    let raw = get_result
        .bytes()
        .await
        .map_err(|e| IngestError::SourceRead {
            object_ref: object.store_ref.url(),
            source: Box::new(e),
        })?;

    match compression {
        Compression::None => Ok(raw.to_vec()),
        Compression::Gzip => {
            let mut decoder = GzDecoder::new(raw.as_ref());
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| IngestError::SourceRead {
                    object_ref: object.store_ref.url(),
                    source: Box::new(e),
                })?;
            Ok(out)
        }
    }
}
