//! Shared key generation for storage backends.
//!
//! Key format: `{prefix}/migracion_{record_id}_{epoch}_{index}.{ext}`. The epoch
//! makes keys from different runs disjoint. The record id is rewritten with
//! `key_safe_id` so keys only hold `[A-Za-z0-9_.-]` and distinct ids never map to
//! the same key.

use crate::traits::{StorageError, StorageResult};
use chrono::Utc;
use galeria_core::{OutputFormat, RecordId};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Run-scoped value mixed into every destination key.
///
/// Generated once per run: unix seconds followed by eight random hex characters,
/// so two runs started within the same second still get different epochs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationEpoch(String);

impl MigrationEpoch {
    pub fn generate() -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", Utc::now().timestamp(), &random[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MigrationEpoch {
    fn from(epoch: &str) -> Self {
        Self(epoch.to_string())
    }
}

impl Display for MigrationEpoch {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Destination key for the asset at `index` of `record_id` in the run `epoch`.
pub fn migrated_asset_key(
    prefix: &str,
    record_id: &RecordId,
    epoch: &MigrationEpoch,
    index: usize,
    format: OutputFormat,
) -> String {
    let file = format!(
        "migracion_{}_{}_{}.{}",
        key_safe_id(record_id),
        epoch,
        index,
        format.extension()
    );
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file
    } else {
        format!("{}/{}", prefix, file)
    }
}

/// Display name for a migrated asset. Depends only on the record id and index.
pub fn migrated_asset_name(record_id: &RecordId, index: usize, format: OutputFormat) -> String {
    format!(
        "migracion_{}_{}.{}",
        key_safe_id(record_id),
        index,
        format.extension()
    )
}

/// Record id as it appears in keys and names.
///
/// ASCII letters, digits and `-` are kept; every other byte, `_` included, becomes
/// `_xx` (lowercase hex). Integer ids are unchanged.
pub fn key_safe_id(record_id: &RecordId) -> String {
    let mut out = String::with_capacity(record_id.as_str().len());
    for byte in record_id.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02x}", byte));
        }
    }
    out
}

/// Reject keys that could escape a storage root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Join a public base URL and a key, percent-encoding each key segment.
pub(crate) fn public_url(base_url: &str, storage_key: &str) -> String {
    let encoded: Vec<String> = storage_key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", base_url.trim_end_matches('/'), encoded.join("/"))
}
