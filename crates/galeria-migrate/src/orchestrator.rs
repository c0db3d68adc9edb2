//! Migration orchestrator
//!
//! For every source record, in listing order:
//! 1. each image is resolved, fetched, staged, transcoded and published; a failing
//!    image is logged and left out, the record carries on
//! 2. the record is rewritten with the migrated image list and written to the
//!    destination catalog; a failing write is logged, the batch carries on
//!
//! Only an unreachable source catalog stops the run. Nothing is retried.

use crate::checkpoint::Checkpoint;
use crate::summary::{AssetFailure, BatchSummary, CommitStatus, RecordOutcome, RecordSummary};
use crate::workspace::{StagingRole, TempWorkspace};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use galeria_catalog::{AssetFetcher, DestinationCatalogWriter, SourceCatalogReader};
use galeria_core::{
    AssetRef, CatalogRecord, DestinationRecord, FailureKind, LogLevel, MigratedAsset,
    MigrationConfig, MigrationError, MigrationResult, OutputFormat, Quality, RecordId, WriteMode,
};
use galeria_processing::AssetTranscoder;
use galeria_storage::{
    migrated_asset_key, migrated_asset_name, DestinationAssetStore, MigrationEpoch,
};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct MigrationComponents {
    pub source: Arc<dyn SourceCatalogReader>,
    pub fetcher: Arc<dyn AssetFetcher>,
    pub transcoder: Arc<dyn AssetTranscoder>,
    pub assets: Arc<dyn DestinationAssetStore>,
    pub writer: Arc<dyn DestinationCatalogWriter>,
}

#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub target_format: OutputFormat,
    pub quality: Quality,
    pub key_prefix: String,
    pub write_mode: WriteMode,
    pub max_concurrent_records: usize,
    pub fetch_timeout: Duration,
    pub transcode_timeout: Duration,
    pub publish_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            target_format: OutputFormat::WebP,
            quality: Quality::DEFAULT,
            key_prefix: "obras".to_string(),
            write_mode: WriteMode::Append,
            max_concurrent_records: 1,
            fetch_timeout: Duration::from_secs(60),
            transcode_timeout: Duration::from_secs(120),
            publish_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(30),
        }
    }
}

impl MigrationOptions {
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self {
            target_format: config.processing.target_format,
            quality: config.processing.quality,
            key_prefix: config.storage.key_prefix.clone(),
            write_mode: config.destination.write_mode,
            max_concurrent_records: config.pipeline.max_concurrent_records,
            fetch_timeout: config.pipeline.fetch_timeout(),
            transcode_timeout: config.pipeline.transcode_timeout(),
            publish_timeout: config.pipeline.publish_timeout(),
            write_timeout: config.pipeline.write_timeout(),
        }
    }
}

pub struct MigrationOrchestrator {
    components: MigrationComponents,
    workspace: Arc<TempWorkspace>,
    options: MigrationOptions,
    checkpoint: Option<Arc<Checkpoint>>,
    epoch: MigrationEpoch,
}

impl MigrationOrchestrator {
    pub fn new(
        components: MigrationComponents,
        workspace: Arc<TempWorkspace>,
        options: MigrationOptions,
    ) -> Self {
        Self {
            components,
            workspace,
            options,
            checkpoint: None,
            epoch: MigrationEpoch::generate(),
        }
    }

    /// Skip records already committed and record new commits in `checkpoint`.
    pub fn with_checkpoint(mut self, checkpoint: Arc<Checkpoint>) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn with_epoch(mut self, epoch: MigrationEpoch) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn epoch(&self) -> &MigrationEpoch {
        &self.epoch
    }

    /// Migrate every source record.
    ///
    /// Returns `Err` only when the source listing fails. Records not yet started
    /// when `cancel` fires are left alone and the summary reports `cancelled`.
    pub async fn run(&self, cancel: &CancellationToken) -> MigrationResult<BatchSummary> {
        let start = Instant::now();

        let records = self
            .components
            .source
            .list_records()
            .await
            .map_err(|e| {
                let error = MigrationError::SourceUnavailable(e.to_string());
                log_failure(&error, None, None);
                error
            })?;

        if records.is_empty() {
            tracing::info!("No records found in source catalog");
        } else {
            tracing::info!(
                record_count = records.len(),
                epoch = %self.epoch,
                format = %self.options.target_format,
                quality = self.options.quality.value(),
                write_mode = %self.options.write_mode,
                max_concurrent_records = self.options.max_concurrent_records,
                "Starting migration"
            );
        }

        let outcomes: Vec<RecordOutcome> = stream::iter(records.iter())
            .map(|record| self.process_record(record, cancel))
            .buffered(self.options.max_concurrent_records.max(1))
            .collect()
            .await;

        let summary = BatchSummary::from_outcomes(outcomes, start.elapsed());
        summary.log();
        Ok(summary)
    }

    async fn process_record(&self, record: &CatalogRecord, cancel: &CancellationToken) -> RecordOutcome {
        if cancel.is_cancelled() {
            return RecordOutcome::NotStarted(record.id.clone());
        }

        if let Some(checkpoint) = &self.checkpoint {
            if checkpoint.is_committed(&record.id).await {
                tracing::info!(record_id = %record.id, "Record already migrated, skipping");
                return RecordOutcome::Skipped(record.id.clone());
            }
        }

        tracing::info!(
            record_id = %record.id,
            title = %record.display_title(),
            asset_count = record.imagenes.len(),
            "Processing record"
        );

        let mut migrated = Vec::with_capacity(record.imagenes.len());
        let mut asset_failures = Vec::new();

        for (index, asset) in record.imagenes.iter().enumerate() {
            match self.migrate_asset(record, index, asset).await {
                Ok(asset) => migrated.push(asset),
                Err(e) => {
                    log_failure(&e, Some(&record.id), Some(index));
                    asset_failures.push(AssetFailure::new(index, &e));
                }
            }
        }

        let document = DestinationRecord::assemble(record, migrated);
        let migrated_assets = document.imagenes.len();

        let commit = match self.commit(&document).await {
            Ok(status) => status,
            Err(e) => {
                log_failure(&e, Some(&record.id), None);
                CommitStatus::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };

        let summary = RecordSummary {
            record_id: record.id.clone(),
            title: record.display_title().to_string(),
            attempted_assets: record.imagenes.len(),
            migrated_assets,
            asset_failures,
            commit,
        };
        summary.log();
        RecordOutcome::Processed(summary)
    }

    async fn commit(&self, document: &DestinationRecord) -> MigrationResult<CommitStatus> {
        let result = within(
            FailureKind::Write,
            self.options.write_timeout,
            self.components
                .writer
                .write(document, self.options.write_mode),
        )
        .await?;

        if let Some(checkpoint) = &self.checkpoint {
            if let Err(e) = checkpoint.mark_committed(&document.source_id).await {
                // The write stands; a restart will simply migrate this record again.
                tracing::warn!(
                    record_id = %document.source_id,
                    error = %e,
                    "Failed to update checkpoint"
                );
            }
        }

        Ok(CommitStatus::Committed {
            document_id: result.document_id,
            action: result.action,
        })
    }

    /// Resolve, fetch, stage, transcode and publish one image.
    ///
    /// Staging files are dropped, and therefore removed, on every return path.
    async fn migrate_asset(
        &self,
        record: &CatalogRecord,
        index: usize,
        asset: &AssetRef,
    ) -> MigrationResult<MigratedAsset> {
        let format = self.options.target_format;

        let address = self
            .components
            .source
            .resolve_asset_address(asset)
            .map_err(|e| MigrationError::MalformedAssetRef(e.to_string()))?;

        let raw = within(
            FailureKind::Fetch,
            self.options.fetch_timeout,
            self.components.fetcher.fetch(&address),
        )
        .await?;

        let input = self
            .workspace
            .stage(&record.id, index, StagingRole::Input, asset.extension(), &raw)
            .await?;
        drop(raw);
        let output = self
            .workspace
            .reserve(&record.id, index, StagingRole::Output, format.extension())?;

        within(
            FailureKind::Transcode,
            self.options.transcode_timeout,
            self.components.transcoder.transcode_file(
                input.path(),
                output.path(),
                format,
                self.options.quality,
            ),
        )
        .await?;

        let encoded = tokio::fs::read(output.path()).await.map_err(|e| {
            MigrationError::Staging(format!(
                "Failed to read {}: {}",
                output.path().display(),
                e
            ))
        })?;
        if encoded.is_empty() {
            return Err(MigrationError::Transcode(format!(
                "{} produced no output",
                self.components.transcoder.name()
            )));
        }

        let key = migrated_asset_key(&self.options.key_prefix, &record.id, &self.epoch, index, format);
        let published = self.publish(&key, Bytes::from(encoded), format).await?;

        tracing::debug!(
            record_id = %record.id,
            asset_index = index,
            key = %published.key,
            "Asset published"
        );

        Ok(MigratedAsset {
            path: published.key,
            url: published.url,
            name: migrated_asset_name(&record.id, index, format),
        })
    }

    async fn publish(
        &self,
        key: &str,
        data: Bytes,
        format: OutputFormat,
    ) -> MigrationResult<galeria_storage::PublishedAsset> {
        let publish = self
            .components
            .assets
            .publish(key, data, format.to_mime_type());

        match tokio::time::timeout(self.options.publish_timeout, publish).await {
            Ok(result) => result.map_err(|e| MigrationError::Publish(e.to_string())),
            Err(_) => {
                // The upload may have landed after all.
                if let Err(e) = self.components.assets.discard(key).await {
                    tracing::warn!(key = %key, error = %e, "Failed to discard timed out upload");
                }
                Err(MigrationError::timed_out(
                    FailureKind::Publish,
                    self.options.publish_timeout,
                ))
            }
        }
    }
}

fn log_failure(error: &MigrationError, record_id: Option<&RecordId>, asset_index: Option<usize>) {
    let record_id = record_id.map(RecordId::as_str);
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(
            record_id,
            asset_index,
            failure_kind = %error.kind(),
            failure_scope = %error.scope(),
            error = %error,
            "Migration step failed"
        ),
        LogLevel::Warn => tracing::warn!(
            record_id,
            asset_index,
            failure_kind = %error.kind(),
            failure_scope = %error.scope(),
            error = %error,
            "Migration step failed"
        ),
        LogLevel::Error => tracing::error!(
            record_id,
            asset_index,
            failure_kind = %error.kind(),
            failure_scope = %error.scope(),
            error = %error,
            "Migration step failed"
        ),
    }
}

/// Await `operation` for at most `limit`, reporting both its error and a
/// timeout as a failure of `kind`.
async fn within<T, E, F>(kind: FailureKind, limit: Duration, operation: F) -> MigrationResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(MigrationError::with_kind(kind, e.to_string())),
        Err(_) => Err(MigrationError::timed_out(kind, limit)),
    }
}
