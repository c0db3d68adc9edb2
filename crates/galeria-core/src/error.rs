//! Error types module
//!
//! Every failure the migration can hit is a `MigrationError`. Each variant knows
//! how far it reaches (`scope()`: one asset, one record's commit, or the whole
//! batch) and how loudly it is reported (`log_level()`). Every failure log line
//! carries both.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected degradations that do not need attention
    Debug,
    /// Recoverable issues: the run continues with less output
    Warn,
    /// Failures that stop the batch
    Error,
}

/// How much of the run a failure invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// Only the current asset; the record keeps going without it
    Asset,
    /// Only the current record's commit; the batch keeps going
    Record,
    /// Nothing can proceed
    Batch,
}

impl FailureScope {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureScope::Asset => "asset",
            FailureScope::Record => "record",
            FailureScope::Batch => "batch",
        }
    }
}

impl Display for FailureScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Machine-readable failure kind attached to every log line and summary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SourceUnavailable,
    MalformedAssetRef,
    Fetch,
    Staging,
    Transcode,
    Publish,
    Write,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::SourceUnavailable => "source_unavailable",
            FailureKind::MalformedAssetRef => "malformed_asset_ref",
            FailureKind::Fetch => "fetch",
            FailureKind::Staging => "staging",
            FailureKind::Transcode => "transcode",
            FailureKind::Publish => "publish",
            FailureKind::Write => "write",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Source catalog unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Malformed asset reference: {0}")]
    MalformedAssetRef(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Staging failed: {0}")]
    Staging(String),

    #[error("Transcode failed: {0}")]
    Transcode(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Write failed: {0}")]
    Write(String),
}

impl MigrationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MigrationError::SourceUnavailable(_) => FailureKind::SourceUnavailable,
            MigrationError::MalformedAssetRef(_) => FailureKind::MalformedAssetRef,
            MigrationError::Fetch(_) => FailureKind::Fetch,
            MigrationError::Staging(_) => FailureKind::Staging,
            MigrationError::Transcode(_) => FailureKind::Transcode,
            MigrationError::Publish(_) => FailureKind::Publish,
            MigrationError::Write(_) => FailureKind::Write,
        }
    }

    pub fn scope(&self) -> FailureScope {
        match self {
            MigrationError::SourceUnavailable(_) => FailureScope::Batch,
            MigrationError::Write(_) => FailureScope::Record,
            MigrationError::MalformedAssetRef(_)
            | MigrationError::Fetch(_)
            | MigrationError::Staging(_)
            | MigrationError::Transcode(_)
            | MigrationError::Publish(_) => FailureScope::Asset,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self.scope() {
            FailureScope::Batch => LogLevel::Error,
            FailureScope::Record => LogLevel::Error,
            FailureScope::Asset => LogLevel::Warn,
        }
    }

    /// Build an error of the given kind.
    pub fn with_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            FailureKind::SourceUnavailable => MigrationError::SourceUnavailable(message),
            FailureKind::MalformedAssetRef => MigrationError::MalformedAssetRef(message),
            FailureKind::Fetch => MigrationError::Fetch(message),
            FailureKind::Staging => MigrationError::Staging(message),
            FailureKind::Transcode => MigrationError::Transcode(message),
            FailureKind::Publish => MigrationError::Publish(message),
            FailureKind::Write => MigrationError::Write(message),
        }
    }

    /// Build the error reported when an operation of the given kind exceeds its deadline.
    pub fn timed_out(kind: FailureKind, after: std::time::Duration) -> Self {
        Self::with_kind(kind, format!("timed out after {:?}", after))
    }
}

pub type MigrationResult<T> = Result<T, MigrationError>;
