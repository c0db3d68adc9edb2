#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(any(feature = "storage-s3", feature = "storage-gcs"))]
use crate::ObjectStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use galeria_core::StorageConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("STORAGE_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;

            let storage = ObjectStorage::s3(
                bucket,
                region,
                config.s3_endpoint.clone(),
                config.public_base_url.clone(),
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-gcs")]
        StorageBackend::Gcs => {
            let bucket = config
                .bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("STORAGE_BUCKET not configured".to_string()))?;

            let storage = ObjectStorage::gcs(bucket, config.public_base_url.clone())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-gcs"))]
        StorageBackend::Gcs => Err(StorageError::ConfigError(
            "GCS storage backend not available (storage-gcs feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;

    fn local_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            backend: StorageBackend::Local,
            bucket: None,
            s3_region: None,
            s3_endpoint: None,
            public_base_url: None,
            local_storage_path: Some(path.to_string_lossy().to_string()),
            local_storage_base_url: Some("http://localhost:8080/public".to_string()),
            key_prefix: "obras".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = create_storage(&local_config(dir.path())).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn test_missing_bucket_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = local_config(dir.path());
        config.backend = StorageBackend::Gcs;

        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
