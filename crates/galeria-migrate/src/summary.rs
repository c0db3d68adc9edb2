//! Per-record and per-batch results

use galeria_catalog::WriteAction;
use galeria_core::{FailureKind, MigrationError, RecordId};
use std::time::Duration;

/// An asset that did not make it to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub index: usize,
    pub kind: FailureKind,
    pub message: String,
}

impl AssetFailure {
    pub fn new(index: usize, error: &MigrationError) -> Self {
        Self {
            index,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    Committed {
        document_id: String,
        action: WriteAction,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub record_id: RecordId,
    pub title: String,
    pub attempted_assets: usize,
    pub migrated_assets: usize,
    pub asset_failures: Vec<AssetFailure>,
    pub commit: CommitStatus,
}

impl RecordSummary {
    pub fn is_committed(&self) -> bool {
        matches!(self.commit, CommitStatus::Committed { .. })
    }

    pub fn log(&self) {
        match &self.commit {
            CommitStatus::Committed {
                document_id,
                action,
            } => tracing::info!(
                record_id = %self.record_id,
                title = %self.title,
                migrated_assets = self.migrated_assets,
                attempted_assets = self.attempted_assets,
                document_id = %document_id,
                action = ?action,
                "Record migrated"
            ),
            CommitStatus::Failed { kind, message } => tracing::warn!(
                record_id = %self.record_id,
                title = %self.title,
                migrated_assets = self.migrated_assets,
                attempted_assets = self.attempted_assets,
                failure_kind = %kind,
                error = %message,
                "Record not written"
            ),
        }
    }
}

/// What happened to one listed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Processed(RecordSummary),
    /// Already committed according to the checkpoint
    Skipped(RecordId),
    /// Cancellation arrived before the record started
    NotStarted(RecordId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub records_listed: usize,
    pub records_processed: usize,
    pub records_with_asset_failures: usize,
    pub records_failed_commit: usize,
    pub records_skipped: usize,
    pub records_not_started: usize,
    pub assets_attempted: usize,
    pub assets_migrated: usize,
    pub cancelled: bool,
    pub duration: Duration,
    /// Processed records in listing order
    pub records: Vec<RecordSummary>,
}

impl BatchSummary {
    /// Tally the outcomes. The run counts as cancelled only when cancellation
    /// left at least one record unstarted.
    pub fn from_outcomes(outcomes: Vec<RecordOutcome>, duration: Duration) -> Self {
        let mut summary = BatchSummary {
            records_listed: outcomes.len(),
            duration,
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome {
                RecordOutcome::Processed(record) => {
                    summary.records_processed += 1;
                    summary.assets_attempted += record.attempted_assets;
                    summary.assets_migrated += record.migrated_assets;
                    if !record.asset_failures.is_empty() {
                        summary.records_with_asset_failures += 1;
                    }
                    if !record.is_committed() {
                        summary.records_failed_commit += 1;
                    }
                    summary.records.push(record);
                }
                RecordOutcome::Skipped(_) => summary.records_skipped += 1,
                RecordOutcome::NotStarted(_) => summary.records_not_started += 1,
            }
        }

        summary.cancelled = summary.records_not_started > 0;
        summary
    }

    pub fn log(&self) {
        tracing::info!(
            records_listed = self.records_listed,
            records_processed = self.records_processed,
            records_with_asset_failures = self.records_with_asset_failures,
            records_failed_commit = self.records_failed_commit,
            records_skipped = self.records_skipped,
            records_not_started = self.records_not_started,
            assets_attempted = self.assets_attempted,
            assets_migrated = self.assets_migrated,
            cancelled = self.cancelled,
            duration_ms = self.duration.as_secs_f64() * 1000.0,
            "Migration finished"
        );
    }
}
