//! Galeria Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and shared
//! enums used by every component of the catalog migration.

pub mod config;
pub mod constants;
pub mod error;
pub mod media_types;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    DestinationConfig, MigrationConfig, PipelineConfig, ProcessingConfig, SourceConfig,
    StorageConfig,
};
pub use error::{FailureKind, FailureScope, LogLevel, MigrationError, MigrationResult};
pub use media_types::{OutputFormat, Quality, SourceKind, TranscoderKind, WriteMode};
pub use models::{AssetRef, CatalogRecord, DestinationRecord, MigratedAsset, RecordAttributes, RecordId};
pub use storage_types::StorageBackend;
