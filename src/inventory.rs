//! Listing and deleting objects in the blob store.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory};
use tokio_stream::StreamExt;
use url::Url;

use crate::config::StorageConfig;
use crate::error::{DeletionError, StorageInventoryError};
use crate::location::StorageLocation;

/// Lists and deletes objects for one bucket.
#[async_trait]
pub trait StorageInventory: Send + Sync {
    /// List all objects under the location's prefix, recursively, as full
    /// object paths. Pagination is exhausted internally; no ordering
    /// guarantee. Listing is directory-scoped: `lab/raw` never yields keys
    /// under a sibling `lab/raw2`.
    async fn list_objects(
        &self,
        location: &StorageLocation,
    ) -> Result<HashSet<String>, StorageInventoryError>;

    /// Delete the named objects, attempting every key independently.
    ///
    /// An empty set returns immediately without touching the backend. Keys
    /// absent from the returned failures were deleted. Deletion is
    /// irreversible.
    async fn delete_objects(&self, keys: HashSet<String>) -> Vec<DeletionError>;
}

/// Object-store-backed inventory, scoped to one bucket.
pub struct ObjectStoreInventory {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreInventory {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Build a bucket-scoped inventory from a storage DSN.
    ///
    /// Fails fast on a malformed or unsupported DSN; no network traffic is
    /// issued here.
    pub fn connect(config: &StorageConfig, bucket: &str) -> Result<Self, StorageInventoryError> {
        Ok(Self::new(build_object_store(&config.dsn, bucket)?))
    }
}

#[async_trait]
impl StorageInventory for ObjectStoreInventory {
    async fn list_objects(
        &self,
        location: &StorageLocation,
    ) -> Result<HashSet<String>, StorageInventoryError> {
        let prefix = ObjectPath::from(location.prefix.as_str());

        let mut keys = HashSet::new();
        let mut list_stream = self.store.list(Some(&prefix));

        while let Some(meta_result) = list_stream.next().await {
            let meta = meta_result.map_err(|source| StorageInventoryError::List {
                prefix: location.prefix.clone(),
                source,
            })?;
            keys.insert(meta.location.to_string());
        }

        tracing::debug!(
            bucket = %location.bucket,
            prefix = %location.prefix,
            inventoried = keys.len(),
            "listed storage inventory"
        );

        Ok(keys)
    }

    async fn delete_objects(&self, keys: HashSet<String>) -> Vec<DeletionError> {
        if keys.is_empty() {
            tracing::debug!("no objects to delete");
            return Vec::new();
        }

        let mut failures = Vec::new();
        for key in keys {
            let path = ObjectPath::from(key.as_str());
            match self.store.delete(&path).await {
                Ok(()) => {
                    tracing::debug!(key = %key, "deleted object");
                }
                Err(source) => {
                    tracing::error!(key = %key, error = %source, "failed to delete object");
                    failures.push(DeletionError { key, source });
                }
            }
        }

        failures
    }
}

/// Create a bucket-scoped object store from a DSN string.
///
/// DSN formats: `s3://[access_key:secret_key@]host[:port]` for AWS or
/// S3-compatible endpoints, `file:///path` for local storage (the bucket
/// becomes a subdirectory), `memory://` for tests.
pub fn build_object_store(
    dsn: &str,
    bucket: &str,
) -> Result<Arc<dyn ObjectStore>, StorageInventoryError> {
    let url = Url::parse(dsn).map_err(|e| StorageInventoryError::InvalidDsn {
        dsn: dsn.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "memory" => Ok(Arc::new(InMemory::new())),
        "file" => {
            let path = url.path();
            if path.is_empty() || path == "/" {
                return Err(StorageInventoryError::InvalidDsn {
                    dsn: dsn.to_string(),
                    reason: "file DSN must specify a path: file:///path/to/storage".to_string(),
                });
            }
            let root = std::path::Path::new(path).join(bucket);
            let store = LocalFileSystem::new_with_prefix(root)
                .map_err(StorageInventoryError::Connect)?;
            Ok(Arc::new(store))
        }
        "s3" => {
            let builder = s3_builder_from_dsn(&url, dsn, bucket)?;
            let store = builder.build().map_err(StorageInventoryError::Connect)?;
            Ok(Arc::new(store))
        }
        scheme => Err(StorageInventoryError::InvalidDsn {
            dsn: dsn.to_string(),
            reason: format!("unsupported storage scheme: {scheme}. Supported: s3, file, memory"),
        }),
    }
}

fn s3_builder_from_dsn(
    url: &Url,
    dsn: &str,
    bucket: &str,
) -> Result<AmazonS3Builder, StorageInventoryError> {
    let host = url.host_str().ok_or_else(|| StorageInventoryError::InvalidDsn {
        dsn: dsn.to_string(),
        reason: "missing S3 host".to_string(),
    })?;
    let port = url.port();

    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(bucket)
        .with_region("us-east-1");

    let access_key = url.username();
    let secret_key = url.password().unwrap_or("");
    if !access_key.is_empty() {
        builder = builder
            .with_access_key_id(access_key)
            .with_secret_access_key(secret_key);
    }

    // Real S3 needs no custom endpoint; anything else (MinIO and friends)
    // gets an explicit endpoint with path-style addressing.
    if !host.contains("amazonaws.com") {
        let scheme = if port == Some(443) { "https" } else { "http" };
        let endpoint = match port {
            Some(p) => format!("{scheme}://{host}:{p}"),
            None => format!("{scheme}://{host}"),
        };
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(true)
            .with_virtual_hosted_style_request(false);
    }

    // Fall back to ambient AWS credentials when the DSN carries none.
    if access_key.is_empty() {
        if let Ok(env_key) = std::env::var("AWS_ACCESS_KEY_ID") {
            builder = builder.with_access_key_id(env_key);
        }
        if let Ok(env_secret) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            builder = builder.with_secret_access_key(env_secret);
        }
        if let Ok(env_region) = std::env::var("AWS_DEFAULT_REGION") {
            builder = builder.with_region(env_region);
        }
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::PutPayload;

    async fn put(store: &Arc<dyn ObjectStore>, key: &str) {
        store
            .put(&ObjectPath::from(key), PutPayload::from_static(b"x"))
            .await
            .unwrap();
    }

    fn inventory_with(store: Arc<dyn ObjectStore>) -> ObjectStoreInventory {
        ObjectStoreInventory::new(store)
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_prefix() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        put(&store, "lab/raw/a.dat").await;
        put(&store, "lab/raw/sub/b.dat").await;
        put(&store, "lab/raw2/c.dat").await;

        let inventory = inventory_with(store);
        let location = StorageLocation::new("lab", "lab-bucket", "lab/raw");
        let keys = inventory.list_objects(&location).await.unwrap();

        let expected: HashSet<String> = ["lab/raw/a.dat", "lab/raw/sub/b.dat"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn test_list_empty_prefix_is_valid() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());

        let inventory = inventory_with(store);
        let location = StorageLocation::new("lab", "lab-bucket", "lab/raw");
        let keys = inventory.list_objects(&location).await.unwrap();

        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_objects() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        put(&store, "lab/raw/a.dat").await;
        put(&store, "lab/raw/b.dat").await;

        let inventory = inventory_with(store.clone());
        let keys: HashSet<String> = ["lab/raw/a.dat", "lab/raw/b.dat"]
            .into_iter()
            .map(String::from)
            .collect();
        let failures = inventory.delete_objects(keys).await;

        assert!(failures.is_empty());
        assert!(store.head(&ObjectPath::from("lab/raw/a.dat")).await.is_err());
        assert!(store.head(&ObjectPath::from("lab/raw/b.dat")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_partial_failure_attempts_all_keys() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        put(&store, "lab/raw/a.dat").await;
        put(&store, "lab/raw/c.dat").await;

        let inventory = inventory_with(store.clone());
        // b.dat is already gone, simulating a not-found race; its failure
        // must not prevent the attempt on the other keys.
        let keys: HashSet<String> = ["lab/raw/a.dat", "lab/raw/b.dat", "lab/raw/c.dat"]
            .into_iter()
            .map(String::from)
            .collect();
        let failures = inventory.delete_objects(keys).await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, "lab/raw/b.dat");
        assert!(store.head(&ObjectPath::from("lab/raw/a.dat")).await.is_err());
        assert!(store.head(&ObjectPath::from("lab/raw/c.dat")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_empty_set_is_a_noop() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let inventory = inventory_with(store);

        let failures = inventory.delete_objects(HashSet::new()).await;
        assert!(failures.is_empty());
    }

    #[test]
    fn test_build_memory_store() {
        let store = build_object_store("memory://", "lab-bucket");
        assert!(store.is_ok());
    }

    #[test]
    fn test_build_s3_store_with_credentials() {
        let store = build_object_store("s3://access:secret@localhost:9000", "lab-bucket");
        assert!(store.is_ok());
    }

    #[test]
    fn test_build_rejects_unsupported_scheme() {
        let err = build_object_store("gcs://somewhere", "lab-bucket").unwrap_err();
        assert!(matches!(err, StorageInventoryError::InvalidDsn { .. }));
    }

    #[test]
    fn test_build_rejects_malformed_dsn() {
        let err = build_object_store("not-a-url", "lab-bucket").unwrap_err();
        assert!(matches!(err, StorageInventoryError::InvalidDsn { .. }));
    }

    #[test]
    fn test_build_file_store_requires_path() {
        let err = build_object_store("file://", "lab-bucket").unwrap_err();
        assert!(matches!(err, StorageInventoryError::InvalidDsn { .. }));
    }
}
