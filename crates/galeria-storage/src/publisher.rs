//! Publishing of transcoded assets.
//!
//! `PublicAssetStore` wraps any `Storage` backend. A publish either returns a
//! key and a public URL, or leaves nothing behind under that key.

use crate::keys::validate_key;
use crate::traits::{Storage, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// A stored, publicly resolvable asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAsset {
    pub key: String,
    pub url: String,
}

/// Destination for migrated asset bytes
#[async_trait]
pub trait DestinationAssetStore: Send + Sync {
    /// Store `data` under `key` with the given content type and return its public reference.
    async fn publish(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<PublishedAsset>;

    /// Remove whatever may have been stored under `key`. Used when a publish is
    /// abandoned midway.
    async fn discard(&self, key: &str) -> StorageResult<()>;
}

pub struct PublicAssetStore {
    storage: Arc<dyn Storage>,
}

impl PublicAssetStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}

#[async_trait]
impl DestinationAssetStore for PublicAssetStore {
    async fn publish(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<PublishedAsset> {
        validate_key(key)?;

        match self.storage.upload_with_key(key, data, content_type).await {
            Ok(url) => Ok(PublishedAsset {
                key: key.to_string(),
                url,
            }),
            Err(e) => {
                // The backend may have accepted the bytes before failing.
                if let Err(cleanup) = self.storage.delete(key).await {
                    tracing::warn!(
                        error = %cleanup,
                        key = %key,
                        backend = %self.storage.backend_type(),
                        "Failed to remove partially published object"
                    );
                }
                Err(e)
            }
        }
    }

    async fn discard(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.storage.delete(key).await
    }
}
