//! Wiring for the `galeria-migrate` binary: command-line overrides, tracing
//! setup, component construction and exit codes.

use anyhow::Context;
use clap::Parser;
use galeria_catalog::{
    CsvCatalogReader, FirestoreCatalogWriter, HttpAssetFetcher, SourceCatalogReader,
    SupabaseCatalogReader,
};
use galeria_core::{
    MigrationConfig, MigrationError, OutputFormat, Quality, SourceKind, TranscoderKind, WriteMode,
};
use galeria_migrate::{
    BatchSummary, Checkpoint, MigrationComponents, MigrationOptions, MigrationOrchestrator,
    TempWorkspace,
};
use galeria_processing::create_transcoder;
use galeria_storage::{create_storage, PublicAssetStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CANCELLED: i32 = 130;

/// Migrate the artwork catalog from Supabase to Firestore.
///
/// Connection settings come from the environment (or `.env`); flags override
/// the pipeline settings.
#[derive(Parser, Debug, Default)]
#[command(name = "galeria-migrate", version)]
pub struct Cli {
    /// Where records are listed from: supabase or csv
    #[arg(long, value_parser = parse_source)]
    pub source: Option<SourceKind>,

    /// CSV export to list records from (implies --source csv)
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Destination write mode: append or upsert
    #[arg(long, value_parser = parse_write_mode)]
    pub write_mode: Option<WriteMode>,

    /// Records migrated concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Checkpoint file for resumable runs
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Directory for staging files
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Transcoder: magick or native
    #[arg(long, value_parser = parse_transcoder)]
    pub transcoder: Option<TranscoderKind>,

    /// Target image format: webp, jpeg, png or avif
    #[arg(long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,

    /// Target quality (1-100)
    #[arg(long)]
    pub quality: Option<u8>,
}

fn parse_source(s: &str) -> Result<SourceKind, String> {
    s.parse::<SourceKind>().map_err(|e| e.to_string())
}

fn parse_write_mode(s: &str) -> Result<WriteMode, String> {
    s.parse::<WriteMode>().map_err(|e| e.to_string())
}

fn parse_transcoder(s: &str) -> Result<TranscoderKind, String> {
    s.parse::<TranscoderKind>().map_err(|e| e.to_string())
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Apply the flags given on the command line on top of `config`.
    pub fn apply(&self, config: &mut MigrationConfig) -> anyhow::Result<()> {
        if let Some(path) = &self.csv {
            config.source.kind = SourceKind::Csv;
            config.source.csv_path = path.clone();
        }
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        if let Some(mode) = self.write_mode {
            config.destination.write_mode = mode;
        }
        if let Some(concurrency) = self.concurrency {
            config.pipeline.max_concurrent_records = concurrency;
        }
        if let Some(path) = &self.checkpoint {
            config.pipeline.checkpoint_path = Some(path.clone());
        }
        if let Some(dir) = &self.staging_dir {
            config.pipeline.staging_dir = dir.clone();
        }
        if let Some(kind) = self.transcoder {
            config.processing.transcoder = kind;
        }
        if let Some(format) = self.format {
            config.processing.target_format = format;
        }
        if let Some(quality) = self.quality {
            config.processing.quality = Quality::new(quality).context("Invalid --quality")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON lines; anything else the compact format.
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Initialize tracing for the migration binary.
pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("galeria=info,warn"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init(),
    }
}

/// Construct every component once and hand them to the orchestrator.
pub async fn build_orchestrator(config: &MigrationConfig) -> anyhow::Result<MigrationOrchestrator> {
    let pipeline = &config.pipeline;
    let longest = [
        pipeline.fetch_timeout(),
        pipeline.publish_timeout(),
        pipeline.write_timeout(),
    ]
    .into_iter()
    .max()
    .unwrap_or(Duration::from_secs(60));

    let client = reqwest::Client::builder()
        .timeout(longest)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("galeria-migrate/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let storage = create_storage(&config.storage)
        .await
        .context("Failed to initialize destination storage")?;
    tracing::info!(backend = %storage.backend_type(), "Destination storage ready");

    let transcoder = create_transcoder(config.processing.transcoder, &config.processing.magick_path)
        .context("Failed to initialize transcoder")?;

    let source: Arc<dyn SourceCatalogReader> = match config.source.kind {
        SourceKind::Supabase => Arc::new(SupabaseCatalogReader::new(client.clone(), &config.source)),
        SourceKind::Csv => Arc::new(CsvCatalogReader::new(&config.source)),
    };
    tracing::info!(source = %config.source.kind, "Source catalog selected");

    let components = MigrationComponents {
        source,
        fetcher: Arc::new(HttpAssetFetcher::new(
            client.clone(),
            pipeline.max_asset_bytes,
        )),
        transcoder,
        assets: Arc::new(PublicAssetStore::new(storage)),
        writer: Arc::new(FirestoreCatalogWriter::new(client, &config.destination)),
    };

    let workspace = TempWorkspace::open(&pipeline.staging_dir)
        .await
        .context("Failed to prepare staging directory")?;

    let mut orchestrator = MigrationOrchestrator::new(
        components,
        Arc::new(workspace),
        MigrationOptions::from_config(config),
    );

    if let Some(path) = &pipeline.checkpoint_path {
        let checkpoint = Checkpoint::load(path)
            .await
            .context("Failed to load checkpoint")?;
        orchestrator = orchestrator.with_checkpoint(Arc::new(checkpoint));
    }

    Ok(orchestrator)
}

/// Process exit code for a finished run.
pub fn exit_code(result: &Result<BatchSummary, MigrationError>) -> i32 {
    match result {
        Ok(summary) if summary.cancelled => EXIT_CANCELLED,
        Ok(_) => EXIT_OK,
        Err(_) => EXIT_FAILURE,
    }
}
