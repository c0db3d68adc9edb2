//! Galeria Storage Library
//!
//! Destination object storage for migrated images. The `Storage` trait hides the
//! backend (S3-compatible, Google Cloud Storage, local filesystem); the
//! `PublicAssetStore` publisher turns it into the pipeline's
//! `DestinationAssetStore`.
//!
//! # Storage key format
//!
//! Migrated assets are stored under
//! `{prefix}/migracion_{record_id}_{epoch}_{index}.{ext}`. The record id is
//! reduced to key-safe characters, the epoch is unique per run. Keys must not contain `..` or a
//! leading `/`. Key generation is centralized in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(feature = "storage-s3", feature = "storage-gcs"))]
pub mod object;
pub mod publisher;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use galeria_core::StorageBackend;
pub use keys::{
    key_safe_id, migrated_asset_key, migrated_asset_name, validate_key, MigrationEpoch,
};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(any(feature = "storage-s3", feature = "storage-gcs"))]
pub use object::ObjectStorage;
pub use publisher::{DestinationAssetStore, PublicAssetStore, PublishedAsset};
pub use traits::{Storage, StorageError, StorageResult};
