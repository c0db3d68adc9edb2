//! In-memory stand-ins for every component the orchestrator depends on.

use async_trait::async_trait;
use bytes::Bytes;
use galeria_catalog::{
    AssetFetcher, CatalogError, CatalogResult, DestinationCatalogWriter, SourceCatalogReader,
};
use galeria_core::{AssetRef, CatalogRecord, DestinationRecord, OutputFormat, Quality, RecordId};
use galeria_migrate::CancellationToken;
use galeria_processing::{AssetTranscoder, TranscodeError, TranscodeResult};
use galeria_storage::{DestinationAssetStore, PublishedAsset, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Input prefix that makes `FakeTranscoder` fail.
pub const UNDECODABLE: &[u8] = b"BAD";
/// Input prefix that makes `FakeTranscoder` hang past any test timeout.
pub const SLOW: &[u8] = b"SLOW";
/// Marker that makes `FakeAssetStore` reject the upload.
pub const UNPUBLISHABLE: &[u8] = b"NOPUBLISH";
/// Marker that makes `FakeAssetStore` store the object, then never answer.
pub const STALLED_PUBLISH: &[u8] = b"STALL";

fn contains(data: &[u8], marker: &[u8]) -> bool {
    data.windows(marker.len()).any(|window| window == marker)
}

#[derive(Default)]
pub struct FakeSource {
    pub records: Mutex<Vec<CatalogRecord>>,
    pub unavailable: AtomicBool,
}

impl FakeSource {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            unavailable: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl SourceCatalogReader for FakeSource {
    async fn list_records(&self) -> CatalogResult<Vec<CatalogRecord>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Request {
                url: "mem://productos".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.records.lock().unwrap().clone())
    }

    fn resolve_asset_address(&self, asset: &AssetRef) -> CatalogResult<String> {
        asset
            .locator()
            .map(|path| format!("mem://{}", path))
            .ok_or_else(|| CatalogError::MalformedAssetRef("missing path".to_string()))
    }
}

#[derive(Default)]
pub struct FakeFetcher {
    pub objects: Mutex<HashMap<String, Bytes>>,
}

impl FakeFetcher {
    pub fn with_objects(objects: &[(&str, &[u8])]) -> Self {
        let objects = objects
            .iter()
            .map(|(path, data)| (format!("mem://{}", path), Bytes::copy_from_slice(data)))
            .collect();
        Self {
            objects: Mutex::new(objects),
        }
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, address: &str) -> CatalogResult<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| CatalogError::Status {
                url: address.to_string(),
                status: 404,
                body: "not found".to_string(),
            })
    }
}

/// "Transcodes" by prefixing the input with `WEBP:`.
#[derive(Default)]
pub struct FakeTranscoder {
    pub calls: Mutex<usize>,
}

#[async_trait]
impl AssetTranscoder for FakeTranscoder {
    async fn transcode(
        &self,
        data: &[u8],
        format: OutputFormat,
        _quality: Quality,
    ) -> TranscodeResult<Bytes> {
        *self.calls.lock().unwrap() += 1;

        if data.starts_with(UNDECODABLE) {
            return Err(TranscodeError::Decode("unknown image signature".to_string()));
        }
        if data.starts_with(SLOW) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        let mut encoded = format!("{}:", format.extension().to_uppercase()).into_bytes();
        encoded.extend_from_slice(data);
        Ok(Bytes::from(encoded))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
pub struct FakeAssetStore {
    /// key -> (bytes, content type)
    pub objects: Mutex<HashMap<String, (Bytes, String)>>,
    pub discarded: Mutex<Vec<String>>,
}

impl FakeAssetStore {
    pub fn keys(&self) -> HashSet<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl DestinationAssetStore for FakeAssetStore {
    async fn publish(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<PublishedAsset> {
        if contains(&data, UNPUBLISHABLE) {
            return Err(StorageError::UploadFailed("quota exceeded".to_string()));
        }

        let stalls = contains(&data, STALLED_PUBLISH);
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        if stalls {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Ok(PublishedAsset {
            key: key.to_string(),
            url: format!("https://cdn.test/{}", key),
        })
    }

    async fn discard(&self, key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(key);
        self.discarded.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// Document store keyed by generated document id.
#[derive(Default)]
pub struct FakeWriter {
    pub documents: Mutex<Vec<(String, DestinationRecord)>>,
    pub rejected_ids: Mutex<HashSet<RecordId>>,
    /// Cancelled right after the first successful write
    pub cancel_after_first_write: Mutex<Option<CancellationToken>>,
    next_id: Mutex<usize>,
}

impl FakeWriter {
    pub fn reject(&self, id: impl Into<RecordId>) {
        self.rejected_ids.lock().unwrap().insert(id.into());
    }

    pub fn documents(&self) -> Vec<DestinationRecord> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|(_, doc)| doc.clone())
            .collect()
    }

    pub fn document_for(&self, id: &str) -> Option<DestinationRecord> {
        self.documents()
            .into_iter()
            .find(|doc| doc.source_id.as_str() == id)
    }

    fn check(&self, record: &DestinationRecord) -> CatalogResult<()> {
        if self.rejected_ids.lock().unwrap().contains(&record.source_id) {
            return Err(CatalogError::Status {
                url: "mem://documents:commit".to_string(),
                status: 403,
                body: "PERMISSION_DENIED".to_string(),
            });
        }
        Ok(())
    }

    fn after_write(&self) {
        if let Some(token) = self.cancel_after_first_write.lock().unwrap().take() {
            token.cancel();
        }
    }
}

#[async_trait]
impl DestinationCatalogWriter for FakeWriter {
    async fn insert(&self, record: &DestinationRecord) -> CatalogResult<String> {
        self.check(record)?;
        let document_id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("doc-{}", *next)
        };
        self.documents
            .lock()
            .unwrap()
            .push((document_id.clone(), record.clone()));
        self.after_write();
        Ok(document_id)
    }

    async fn find_by_source_id(&self, source_id: &RecordId) -> CatalogResult<Option<String>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|(_, doc)| &doc.source_id == source_id)
            .map(|(id, _)| id.clone()))
    }

    async fn replace(&self, document_id: &str, record: &DestinationRecord) -> CatalogResult<()> {
        self.check(record)?;
        let mut documents = self.documents.lock().unwrap();
        let slot = documents
            .iter_mut()
            .find(|(id, _)| id == document_id)
            .ok_or_else(|| CatalogError::Status {
                url: format!("mem://documents/{}", document_id),
                status: 404,
                body: "NOT_FOUND".to_string(),
            })?;
        slot.1 = record.clone();
        drop(documents);
        self.after_write();
        Ok(())
    }
}
