//! Configuration module
//!
//! Everything is read from the environment (optionally seeded from a `.env` file).
//! `from_lookup` takes the variable source as a closure so tests never touch the
//! process environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::constants::*;
use crate::media_types::{OutputFormat, Quality, SourceKind, TranscoderKind, WriteMode};
use crate::storage_types::StorageBackend;

/// Source catalog settings
///
/// Records come from the Supabase table or from a CSV export of it. Images are
/// always fetched from the Supabase bucket, so `supabase_url` is needed either way.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub supabase_url: String,
    /// Empty when listing from a CSV export
    pub supabase_key: String,
    pub csv_path: PathBuf,
    pub table: String,
    pub bucket: String,
    pub page_size: usize,
}

/// Destination catalog (Firestore) settings
#[derive(Clone, Debug)]
pub struct DestinationConfig {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub collection: String,
    pub access_token: String,
    pub write_mode: WriteMode,
}

/// Destination object storage settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub public_base_url: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub key_prefix: String,
}

/// Transcode settings
#[derive(Clone, Debug)]
pub struct ProcessingConfig {
    pub transcoder: TranscoderKind,
    pub magick_path: String,
    pub target_format: OutputFormat,
    pub quality: Quality,
}

/// Orchestration settings
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub staging_dir: PathBuf,
    pub checkpoint_path: Option<PathBuf>,
    pub max_concurrent_records: usize,
    pub fetch_timeout_secs: u64,
    pub transcode_timeout_secs: u64,
    pub publish_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub max_asset_bytes: u64,
}

impl PipelineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

/// Complete migration configuration.
#[derive(Clone, Debug)]
pub struct MigrationConfig {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub storage: StorageConfig,
    pub processing: ProcessingConfig,
    pub pipeline: PipelineConfig,
}

impl MigrationConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| anyhow!("{} must be set", key));

        let source_kind = var("SOURCE_KIND")
            .map(|v| v.parse::<SourceKind>())
            .transpose()?
            .unwrap_or_default();
        let source = SourceConfig {
            kind: source_kind,
            supabase_url: required("SUPABASE_URL")?,
            // Required for the live table only; checked in `validate`
            supabase_key: var("SUPABASE_KEY").unwrap_or_default(),
            csv_path: var("SOURCE_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_CSV_PATH)),
            table: var("SOURCE_TABLE").unwrap_or_else(|| DEFAULT_SOURCE_TABLE.to_string()),
            bucket: var("SOURCE_BUCKET").unwrap_or_else(|| DEFAULT_SOURCE_BUCKET.to_string()),
            page_size: parse_or(&var, "SOURCE_PAGE_SIZE", DEFAULT_SOURCE_PAGE_SIZE)?,
        };

        let destination = DestinationConfig {
            base_url: var("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string()),
            project_id: required("FIRESTORE_PROJECT_ID")?,
            database: var("FIRESTORE_DATABASE")
                .unwrap_or_else(|| DEFAULT_FIRESTORE_DATABASE.to_string()),
            collection: var("FIRESTORE_COLLECTION")
                .unwrap_or_else(|| DEFAULT_DESTINATION_COLLECTION.to_string()),
            access_token: required("FIRESTORE_ACCESS_TOKEN")?,
            write_mode: var("WRITE_MODE")
                .map(|v| v.parse::<WriteMode>())
                .transpose()?
                .unwrap_or_default(),
        };

        let storage = StorageConfig {
            backend: var("STORAGE_BACKEND")
                .map(|v| v.parse::<StorageBackend>())
                .transpose()?
                .unwrap_or(StorageBackend::Gcs),
            bucket: var("STORAGE_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            public_base_url: var("STORAGE_PUBLIC_BASE_URL"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            key_prefix: var("ASSET_KEY_PREFIX")
                .unwrap_or_else(|| DEFAULT_ASSET_KEY_PREFIX.to_string()),
        };

        let processing = ProcessingConfig {
            transcoder: var("TRANSCODER")
                .map(|v| v.parse::<TranscoderKind>())
                .transpose()?
                .unwrap_or_default(),
            magick_path: var("MAGICK_PATH").unwrap_or_else(|| DEFAULT_MAGICK_PATH.to_string()),
            target_format: var("TARGET_FORMAT")
                .map(|v| OutputFormat::parse(&v))
                .transpose()?
                .unwrap_or_default(),
            quality: Quality::new(parse_or(&var, "TARGET_QUALITY", Quality::DEFAULT.value())?)?,
        };

        let pipeline = PipelineConfig {
            staging_dir: var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            checkpoint_path: var("CHECKPOINT_PATH").map(PathBuf::from),
            max_concurrent_records: parse_or(&var, "MAX_CONCURRENT_RECORDS", 1)?,
            fetch_timeout_secs: parse_or(&var, "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
            transcode_timeout_secs: parse_or(
                &var,
                "TRANSCODE_TIMEOUT_SECS",
                DEFAULT_TRANSCODE_TIMEOUT_SECS,
            )?,
            publish_timeout_secs: parse_or(
                &var,
                "PUBLISH_TIMEOUT_SECS",
                DEFAULT_PUBLISH_TIMEOUT_SECS,
            )?,
            write_timeout_secs: parse_or(&var, "WRITE_TIMEOUT_SECS", DEFAULT_WRITE_TIMEOUT_SECS)?,
            max_asset_bytes: parse_or(&var, "MAX_ASSET_BYTES", DEFAULT_MAX_ASSET_BYTES)?,
        };

        Ok(MigrationConfig {
            source,
            destination,
            storage,
            processing,
            pipeline,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.source.supabase_url.starts_with("http://")
            && !self.source.supabase_url.starts_with("https://")
        {
            return Err(anyhow!("SUPABASE_URL must be an http(s) URL"));
        }

        if self.source.kind == SourceKind::Supabase && self.source.supabase_key.is_empty() {
            return Err(anyhow!("SOURCE_KIND=supabase requires SUPABASE_KEY"));
        }

        if self.source.page_size == 0 {
            return Err(anyhow!("SOURCE_PAGE_SIZE must be greater than 0"));
        }

        if self.pipeline.max_concurrent_records == 0 {
            return Err(anyhow!("MAX_CONCURRENT_RECORDS must be at least 1"));
        }

        let timeouts = [
            ("FETCH_TIMEOUT_SECS", self.pipeline.fetch_timeout_secs),
            ("TRANSCODE_TIMEOUT_SECS", self.pipeline.transcode_timeout_secs),
            ("PUBLISH_TIMEOUT_SECS", self.pipeline.publish_timeout_secs),
            ("WRITE_TIMEOUT_SECS", self.pipeline.write_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(anyhow!("{} must be greater than 0", name));
        }

        let prefix = &self.storage.key_prefix;
        if prefix.starts_with('/') || prefix.contains("..") {
            return Err(anyhow!(
                "ASSET_KEY_PREFIX must be relative and must not contain '..'"
            ));
        }

        match self.storage.backend {
            StorageBackend::S3 | StorageBackend::Gcs => {
                if self.storage.bucket.is_none() {
                    return Err(anyhow!(
                        "STORAGE_BACKEND={} requires STORAGE_BUCKET to be set",
                        self.storage.backend
                    ));
                }
                if self.storage.backend == StorageBackend::S3 && self.storage.s3_region.is_none()
                {
                    return Err(anyhow!("S3_REGION or AWS_REGION must be set for S3 storage"));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none()
                    || self.storage.local_storage_base_url.is_none()
                {
                    return Err(anyhow!(
                        "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL"
                    ));
                }
            }
        }

        Ok(())
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}
