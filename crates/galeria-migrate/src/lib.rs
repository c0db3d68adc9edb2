//! Galeria Migration Library
//!
//! Drives the per-record migration: list source records, then for every image
//! fetch, stage, transcode, publish, and finally write the rewritten record to
//! the destination catalog. Components are injected as trait objects so the
//! orchestrator never knows which backends it talks to.

pub mod checkpoint;
pub mod orchestrator;
pub mod summary;
pub mod workspace;

pub use checkpoint::{Checkpoint, CheckpointError};
pub use orchestrator::{MigrationComponents, MigrationOptions, MigrationOrchestrator};
pub use summary::{AssetFailure, BatchSummary, CommitStatus, RecordOutcome, RecordSummary};
pub use workspace::{StagingFile, StagingRole, TempWorkspace};

pub use tokio_util::sync::CancellationToken;
