//! Enums selected by configuration and shared between the transcoder, the key
//! derivation and the catalog writer.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Target encoding for migrated images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
    Png,
    Avif,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "webp" => Ok(OutputFormat::WebP),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "avif" => Ok(OutputFormat::Avif),
            _ => Err(anyhow!("Invalid format: {}", s)),
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Avif => "image/avif",
        }
    }

    /// File extension used for staged files, destination keys and display names.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Avif => "avif",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

/// Encoder quality in the 1-100 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const DEFAULT: Quality = Quality(80);

    pub fn new(value: u8) -> Result<Self> {
        if (1..=100).contains(&value) {
            Ok(Quality(value))
        } else {
            Err(anyhow!("Quality must be between 1 and 100, got {}", value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Quality {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Which transcoder implementation the CLI wires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscoderKind {
    /// External ImageMagick CLI
    #[default]
    Magick,
    /// In-process `image` codecs
    Native,
}

impl FromStr for TranscoderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "magick" | "imagemagick" => Ok(TranscoderKind::Magick),
            "native" => Ok(TranscoderKind::Native),
            _ => Err(anyhow!("Invalid transcoder: {}", s)),
        }
    }
}

impl Display for TranscoderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TranscoderKind::Magick => write!(f, "magick"),
            TranscoderKind::Native => write!(f, "native"),
        }
    }
}

/// Where source records are listed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Live PostgREST table
    #[default]
    Supabase,
    /// CSV export of the same table
    Csv,
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "supabase" => Ok(SourceKind::Supabase),
            "csv" => Ok(SourceKind::Csv),
            _ => Err(anyhow!("Invalid source kind: {}", s)),
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SourceKind::Supabase => write!(f, "supabase"),
            SourceKind::Csv => write!(f, "csv"),
        }
    }
}

/// How the destination writer treats a record migrated by an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Always insert a new document (re-runs duplicate records)
    #[default]
    Append,
    /// Replace the document carrying the same source id, insert otherwise
    Upsert,
}

impl FromStr for WriteMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "append" => Ok(WriteMode::Append),
            "upsert" => Ok(WriteMode::Upsert),
            _ => Err(anyhow!("Invalid write mode: {}", s)),
        }
    }
}

impl Display for WriteMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            WriteMode::Append => write!(f, "append"),
            WriteMode::Upsert => write!(f, "upsert"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("webp").unwrap(), OutputFormat::WebP);
        assert_eq!(OutputFormat::parse("JPG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("jpeg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("png").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::parse("avif").unwrap(), OutputFormat::Avif);
        assert!(OutputFormat::parse("tiff").is_err());
    }

    #[test]
    fn test_output_format_to_mime_type() {
        assert_eq!(OutputFormat::WebP.to_mime_type(), "image/webp");
        assert_eq!(OutputFormat::Jpeg.to_mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.to_mime_type(), "image/png");
        assert_eq!(OutputFormat::Avif.to_mime_type(), "image/avif");
    }

    #[test]
    fn test_quality_bounds() {
        assert!(Quality::new(0).is_err());
        assert!(Quality::new(101).is_err());
        assert_eq!(Quality::new(1).unwrap().value(), 1);
        assert_eq!(Quality::new(100).unwrap().value(), 100);
        assert_eq!(Quality::default().value(), 80);
    }

    #[test]
    fn test_write_mode_and_transcoder_parse() {
        assert_eq!("UPSERT".parse::<WriteMode>().unwrap(), WriteMode::Upsert);
        assert_eq!("append".parse::<WriteMode>().unwrap(), WriteMode::Append);
        assert!("merge".parse::<WriteMode>().is_err());
        assert_eq!(
            "imagemagick".parse::<TranscoderKind>().unwrap(),
            TranscoderKind::Magick
        );
        assert_eq!(
            "native".parse::<TranscoderKind>().unwrap(),
            TranscoderKind::Native
        );
        assert_eq!("CSV".parse::<SourceKind>().unwrap(), SourceKind::Csv);
        assert_eq!(SourceKind::default(), SourceKind::Supabase);
        assert!("sqlite".parse::<SourceKind>().is_err());
    }
}
