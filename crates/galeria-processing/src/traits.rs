//! Transcoder abstraction

use async_trait::async_trait;
use bytes::Bytes;
use galeria_core::{OutputFormat, Quality};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Input is not a decodable image: {0}")]
    Decode(String),

    #[error("Encoding to {format} failed: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },

    #[error("Failed to execute {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Unsupported transcode: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TranscodeResult<T> = Result<T, TranscodeError>;

/// Converts image bytes from any supported input encoding to a target encoding.
#[async_trait]
pub trait AssetTranscoder: Send + Sync {
    /// Transcode `data` to `format` at `quality`.
    async fn transcode(
        &self,
        data: &[u8],
        format: OutputFormat,
        quality: Quality,
    ) -> TranscodeResult<Bytes>;

    /// Transcode the file at `input` into `output`.
    ///
    /// `output` must already exist (it is reserved by the caller) and is
    /// overwritten. The default goes through `transcode`.
    async fn transcode_file(
        &self,
        input: &Path,
        output: &Path,
        format: OutputFormat,
        quality: Quality,
    ) -> TranscodeResult<()> {
        let data = tokio::fs::read(input).await?;
        let encoded = self.transcode(&data, format, quality).await?;
        tokio::fs::write(output, &encoded).await?;
        Ok(())
    }

    /// Short name for logs
    fn name(&self) -> &'static str;
}
