//! Capabilities the migration pipeline depends on

use crate::error::CatalogResult;
use async_trait::async_trait;
use bytes::Bytes;
use galeria_core::{AssetRef, CatalogRecord, DestinationRecord, RecordId, WriteMode};

/// Read side of the migration.
#[async_trait]
pub trait SourceCatalogReader: Send + Sync {
    /// Every source record, in a stable order. An empty catalog is `Ok(vec![])`.
    async fn list_records(&self) -> CatalogResult<Vec<CatalogRecord>>;

    /// Turn an asset reference into a fetchable address. Pure; fails only on a
    /// missing or blank locator.
    fn resolve_asset_address(&self, asset: &AssetRef) -> CatalogResult<String>;
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, address: &str) -> CatalogResult<Bytes>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    pub document_id: String,
    pub action: WriteAction,
}

/// Write side of the migration.
///
/// Implementations stamp the migration timestamp server-side on every insert and
/// replace.
#[async_trait]
pub trait DestinationCatalogWriter: Send + Sync {
    /// Create a new document and return its id
    async fn insert(&self, record: &DestinationRecord) -> CatalogResult<String>;

    /// Id of the document previously written for `source_id`, if any
    async fn find_by_source_id(&self, source_id: &RecordId) -> CatalogResult<Option<String>>;

    /// Overwrite the document `document_id` with `record`
    async fn replace(&self, document_id: &str, record: &DestinationRecord) -> CatalogResult<()>;

    async fn write(&self, record: &DestinationRecord, mode: WriteMode) -> CatalogResult<WriteResult> {
        if mode == WriteMode::Upsert {
            if let Some(document_id) = self.find_by_source_id(&record.source_id).await? {
                self.replace(&document_id, record).await?;
                return Ok(WriteResult {
                    document_id,
                    action: WriteAction::Updated,
                });
            }
        }

        let document_id = self.insert(record).await?;
        Ok(WriteResult {
            document_id,
            action: WriteAction::Inserted,
        })
    }
}
