//! In-process transcoder built on the `image`, `webp` and `ravif` crates

use crate::traits::{AssetTranscoder, TranscodeError, TranscodeResult};
use async_trait::async_trait;
use bytes::Bytes;
use galeria_core::{OutputFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeTranscoder;

impl NativeTranscoder {
    pub fn new() -> Self {
        Self
    }

    fn encode(img: &DynamicImage, format: OutputFormat, quality: Quality) -> TranscodeResult<Bytes> {
        let encode_err = |e: &dyn std::fmt::Display| TranscodeError::Encode {
            format,
            message: e.to_string(),
        };

        match format {
            OutputFormat::WebP => {
                let (width, height) = img.dimensions();
                let rgba_img = img.to_rgba8();
                let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
                let webp_data = encoder.encode(quality.value() as f32);
                Ok(Bytes::copy_from_slice(&webp_data))
            }
            OutputFormat::Jpeg => {
                let mut buffer = Vec::new();
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.value());
                DynamicImage::ImageRgb8(img.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_err(&e))?;
                Ok(Bytes::from(buffer))
            }
            OutputFormat::Png => {
                // Lossless; quality does not apply
                let mut buffer = Vec::new();
                img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                    .map_err(|e| encode_err(&e))?;
                Ok(Bytes::from(buffer))
            }
            OutputFormat::Avif => {
                let (width, height) = img.dimensions();
                let rgb_img = img.to_rgb8();
                let rgb_data: Vec<rgb::RGB8> = rgb_img
                    .as_raw()
                    .chunks_exact(3)
                    .map(|chunk| rgb::RGB8::new(chunk[0], chunk[1], chunk[2]))
                    .collect();

                let img_buf = ravif::Img::new(rgb_data.as_slice(), width as usize, height as usize);
                let encoder = ravif::Encoder::new()
                    .with_quality(quality.value() as f32)
                    .with_speed(6);

                let avif_data = encoder.encode_rgb(img_buf).map_err(|e| encode_err(&e))?;
                Ok(Bytes::copy_from_slice(&avif_data.avif_file))
            }
        }
    }
}

#[async_trait]
impl AssetTranscoder for NativeTranscoder {
    async fn transcode(
        &self,
        data: &[u8],
        format: OutputFormat,
        quality: Quality,
    ) -> TranscodeResult<Bytes> {
        if data.is_empty() {
            return Err(TranscodeError::Decode("input is empty".to_string()));
        }

        let data = data.to_vec();
        tokio::task::spawn_blocking(move || {
            let img = image::load_from_memory(&data)
                .map_err(|e| TranscodeError::Decode(e.to_string()))?;
            Self::encode(&img, format, quality)
        })
        .await
        .map_err(|e| TranscodeError::Unsupported(format!("transcode task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn sample_png() -> Vec<u8> {
        let img = ImageBuffer::from_fn(16, 12, |x, y| Rgb([(x * 15) as u8, (y * 20) as u8, 128u8]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[tokio::test]
    async fn test_png_to_webp() {
        let output = NativeTranscoder::new()
            .transcode(&sample_png(), OutputFormat::WebP, Quality::DEFAULT)
            .await
            .unwrap();

        assert_eq!(&output[0..4], b"RIFF");
        assert_eq!(&output[8..12], b"WEBP");
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!(decoded.dimensions(), (16, 12));
    }

    #[tokio::test]
    async fn test_png_to_jpeg() {
        let output = NativeTranscoder::new()
            .transcode(&sample_png(), OutputFormat::Jpeg, Quality::new(70).unwrap())
            .await
            .unwrap();
        assert_eq!(&output[0..2], &[0xFFu8, 0xD8]);
    }

    #[tokio::test]
    async fn test_garbage_input_fails() {
        let transcoder = NativeTranscoder::new();

        let result = transcoder
            .transcode(b"definitely not an image", OutputFormat::WebP, Quality::DEFAULT)
            .await;
        assert!(matches!(result, Err(TranscodeError::Decode(_))));

        let result = transcoder
            .transcode(b"", OutputFormat::WebP, Quality::DEFAULT)
            .await;
        assert!(matches!(result, Err(TranscodeError::Decode(_))));
    }

    #[tokio::test]
    async fn test_transcode_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input_7_0.png");
        let output = dir.path().join("output_7_0.webp");
        std::fs::write(&input, sample_png()).unwrap();
        std::fs::File::create(&output).unwrap();

        NativeTranscoder::new()
            .transcode_file(&input, &output, OutputFormat::WebP, Quality::DEFAULT)
            .await
            .unwrap();

        let written = std::fs::read(&output).unwrap();
        assert_eq!(&written[8..12], b"WEBP");
    }
}
