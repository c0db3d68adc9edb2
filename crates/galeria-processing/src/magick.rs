//! ImageMagick-backed transcoder

use crate::traits::{AssetTranscoder, TranscodeError, TranscodeResult};
use async_trait::async_trait;
use bytes::Bytes;
use galeria_core::{OutputFormat, Quality};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Runs `magick <input> -quality <q> <format>:<output>`.
pub struct MagickTranscoder {
    magick_path: String,
}

impl MagickTranscoder {
    pub fn new(magick_path: String) -> Self {
        Self { magick_path }
    }

    fn build_args(input: &Path, output: &Path, format: OutputFormat, quality: Quality) -> Vec<String> {
        vec![
            input.to_string_lossy().to_string(),
            "-quality".to_string(),
            quality.value().to_string(),
            format!("{}:{}", magick_format(format), output.to_string_lossy()),
        ]
    }
}

/// ImageMagick's coder name for an output format
fn magick_format(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::WebP => "webp",
        OutputFormat::Jpeg => "jpeg",
        OutputFormat::Png => "png",
        OutputFormat::Avif => "avif",
    }
}

#[async_trait]
impl AssetTranscoder for MagickTranscoder {
    async fn transcode(
        &self,
        data: &[u8],
        format: OutputFormat,
        quality: Quality,
    ) -> TranscodeResult<Bytes> {
        // ImageMagick works on files; stage through private temp files.
        let input_temp = tempfile::NamedTempFile::new()?;
        tokio::fs::write(input_temp.path(), data).await?;

        let output_temp = tempfile::NamedTempFile::new()?;
        self.transcode_file(input_temp.path(), output_temp.path(), format, quality)
            .await?;

        let encoded = tokio::fs::read(output_temp.path()).await?;
        Ok(Bytes::from(encoded))
    }

    async fn transcode_file(
        &self,
        input: &Path,
        output: &Path,
        format: OutputFormat,
        quality: Quality,
    ) -> TranscodeResult<()> {
        let args = Self::build_args(input, output, format, quality);
        let start = std::time::Instant::now();

        let result = Command::new(&self.magick_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TranscodeError::Spawn {
                program: self.magick_path.clone(),
                message: e.to_string(),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(TranscodeError::ProcessFailed {
                program: self.magick_path.clone(),
                status: result.status.to_string(),
                stderr,
            });
        }

        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            format = %format,
            quality = quality.value(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "ImageMagick transcode finished"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "magick"
    }
}
