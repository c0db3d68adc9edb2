//! Test helpers: wire the orchestrator to in-memory fakes.
//!
//! Run from workspace root: `cargo test -p galeria-migrate`.

#![allow(dead_code)]

pub mod fakes;

use fakes::{FakeAssetStore, FakeFetcher, FakeSource, FakeTranscoder, FakeWriter};
use galeria_core::{AssetRef, CatalogRecord};
use galeria_migrate::{MigrationComponents, MigrationOptions, MigrationOrchestrator, TempWorkspace};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Orchestrator dependencies plus the staging directory they run against.
pub struct Harness {
    pub source: Arc<FakeSource>,
    pub fetcher: Arc<FakeFetcher>,
    pub transcoder: Arc<FakeTranscoder>,
    pub assets: Arc<FakeAssetStore>,
    pub writer: Arc<FakeWriter>,
    pub workspace: Arc<TempWorkspace>,
    pub _staging: TempDir,
}

impl Harness {
    pub async fn new(records: Vec<CatalogRecord>, objects: &[(&str, &[u8])]) -> Self {
        let staging = tempfile::tempdir().unwrap();
        let workspace = TempWorkspace::open(staging.path().join("temp_images"))
            .await
            .unwrap();

        Self {
            source: Arc::new(FakeSource::new(records)),
            fetcher: Arc::new(FakeFetcher::with_objects(objects)),
            transcoder: Arc::new(FakeTranscoder::default()),
            assets: Arc::new(FakeAssetStore::default()),
            writer: Arc::new(FakeWriter::default()),
            workspace: Arc::new(workspace),
            _staging: staging,
        }
    }

    pub fn components(&self) -> MigrationComponents {
        MigrationComponents {
            source: self.source.clone(),
            fetcher: self.fetcher.clone(),
            transcoder: self.transcoder.clone(),
            assets: self.assets.clone(),
            writer: self.writer.clone(),
        }
    }

    pub fn orchestrator(&self, options: MigrationOptions) -> MigrationOrchestrator {
        MigrationOrchestrator::new(self.components(), self.workspace.clone(), options)
    }

    /// Files currently in the staging directory
    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(self.workspace.root()).unwrap().count()
    }
}

/// Options with short timeouts so hung operations fail fast.
pub fn test_options() -> MigrationOptions {
    MigrationOptions {
        fetch_timeout: Duration::from_secs(5),
        transcode_timeout: Duration::from_secs(5),
        publish_timeout: Duration::from_secs(5),
        write_timeout: Duration::from_secs(5),
        ..MigrationOptions::default()
    }
}

pub fn record(id: i64, paths: &[&str]) -> CatalogRecord {
    CatalogRecord::new(id, paths.iter().map(|p| AssetRef::new(*p)).collect())
        .with_title(format!("Obra {}", id))
}
