//! Galeria Processing Library
//!
//! Image transcoding for the catalog migration. `MagickTranscoder` shells out to
//! the ImageMagick CLI; `NativeTranscoder` encodes in-process with the `image`,
//! `webp` and `ravif` crates.

pub mod magick;
#[cfg(feature = "native")]
pub mod native;
pub mod traits;

pub use magick::MagickTranscoder;
#[cfg(feature = "native")]
pub use native::NativeTranscoder;
pub use traits::{AssetTranscoder, TranscodeError, TranscodeResult};

use galeria_core::TranscoderKind;
use std::sync::Arc;

/// Build the transcoder selected by configuration.
pub fn create_transcoder(
    kind: TranscoderKind,
    magick_path: &str,
) -> TranscodeResult<Arc<dyn AssetTranscoder>> {
    match kind {
        TranscoderKind::Magick => Ok(Arc::new(MagickTranscoder::new(magick_path.to_string()))),
        #[cfg(feature = "native")]
        TranscoderKind::Native => Ok(Arc::new(NativeTranscoder::new())),
        #[cfg(not(feature = "native"))]
        TranscoderKind::Native => Err(TranscodeError::Unsupported(
            "native transcoder not available (native feature not enabled)".to_string(),
        )),
    }
}
