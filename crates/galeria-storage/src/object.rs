use crate::keys::{public_url, validate_key};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};

#[cfg(feature = "storage-s3")]
use object_store::aws::{AmazonS3, AmazonS3Builder};
#[cfg(feature = "storage-gcs")]
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};

/// Remote object storage (S3-compatible or Google Cloud Storage)
///
/// Objects are expected to be publicly readable through the bucket's access
/// policy; the returned URL is built from `public_base_url`.
#[derive(Clone)]
pub struct ObjectStorage<S> {
    store: S,
    bucket: String,
    public_base_url: String,
    backend: StorageBackend,
}

#[cfg(feature = "storage-s3")]
impl ObjectStorage<AmazonS3> {
    /// Create an S3 (or S3-compatible) storage
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `public_base_url` - Optional base for public URLs; defaults to the
    ///   virtual-hosted AWS URL or `{endpoint}/{bucket}`
    pub fn s3(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        public_base_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let public_base_url = public_base_url.unwrap_or_else(|| match endpoint_url {
            // Path-style for S3-compatible providers: {endpoint}/{bucket}
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        });

        Ok(ObjectStorage {
            store,
            bucket,
            public_base_url,
            backend: StorageBackend::S3,
        })
    }
}

#[cfg(feature = "storage-gcs")]
impl ObjectStorage<GoogleCloudStorage> {
    /// Create a Google Cloud Storage (or Firebase Storage) backed storage
    ///
    /// Service account credentials are picked up from the environment
    /// (`GOOGLE_SERVICE_ACCOUNT`, `GOOGLE_APPLICATION_CREDENTIALS`, ...).
    pub fn gcs(bucket: String, public_base_url: Option<String>) -> StorageResult<Self> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let public_base_url = public_base_url
            .unwrap_or_else(|| format!("https://storage.googleapis.com/{}", bucket));

        Ok(ObjectStorage {
            store,
            bucket,
            public_base_url,
            backend: StorageBackend::Gcs,
        })
    }
}

/// Object location for `storage_key`, taken verbatim so the stored name and the
/// public URL agree.
fn object_path(storage_key: &str) -> StorageResult<Path> {
    Path::parse(storage_key).map_err(|e| StorageError::InvalidKey(e.to_string()))
}

#[async_trait]
impl<S> Storage for ObjectStorage<S>
where
    S: ObjectStore,
{
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;

        let size = data.len() as u64;
        let location = object_path(storage_key)?;
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.backend,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let url = public_url(&self.public_base_url, storage_key);

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %storage_key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(url)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;

        let start = std::time::Instant::now();
        let location = object_path(storage_key)?;

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    backend = %self.backend,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{migrated_asset_key, MigrationEpoch};
    use galeria_core::{OutputFormat, RecordId};
    use object_store::memory::InMemory;

    fn storage() -> ObjectStorage<InMemory> {
        ObjectStorage {
            store: InMemory::new(),
            bucket: "galeria".to_string(),
            public_base_url: "https://cdn.test".to_string(),
            backend: StorageBackend::Gcs,
        }
    }

    #[tokio::test]
    async fn test_url_points_at_stored_object() {
        let storage = storage();
        let key = migrated_asset_key(
            "obras",
            &RecordId::new("a/b ó"),
            &MigrationEpoch::from("e"),
            0,
            OutputFormat::WebP,
        );

        let url = storage
            .upload_with_key(&key, Bytes::from_static(b"RIFF"), "image/webp")
            .await
            .unwrap();

        let stored = storage.store.head(&Path::parse(&key).unwrap()).await.unwrap();
        assert_eq!(stored.location.to_string(), key);
        assert_eq!(url, format!("https://cdn.test/{}", key));
    }

    #[tokio::test]
    async fn test_key_is_stored_verbatim() {
        let storage = storage();
        let url = storage
            .upload_with_key("obras/raw%2Fname.webp", Bytes::from_static(b"x"), "image/webp")
            .await
            .unwrap();

        let stored = storage
            .store
            .head(&Path::parse("obras/raw%2Fname.webp").unwrap())
            .await
            .unwrap();
        assert_eq!(stored.location.to_string(), "obras/raw%2Fname.webp");
        assert_eq!(url, "https://cdn.test/obras/raw%252Fname.webp");

        storage.delete("obras/raw%2Fname.webp").await.unwrap();
        assert!(storage
            .store
            .head(&Path::parse("obras/raw%2Fname.webp").unwrap())
            .await
            .is_err());
    }
}
