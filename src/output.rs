//! Artifact naming and JPEG encoding.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::ImageError;

/// Filename for an ordinal: `fake001.jpg`, `fake042.jpg`, `fake1000.jpg`.
///
/// The width is a minimum, so ordinals past 999 widen instead of wrapping
/// and names already on disk never change.
#[must_use]
pub fn artifact_filename(ordinal: usize) -> String {
    format!("fake{ordinal:03}.jpg")
}

/// Full artifact path for an ordinal inside `output_dir`.
#[must_use]
pub fn artifact_path(output_dir: &Path, ordinal: usize) -> PathBuf {
    output_dir.join(artifact_filename(ordinal))
}

/// Decode image bytes of any supported format and re-encode them as JPEG.
///
/// Anything that is not already 8-bit RGB is converted first, since JPEG
/// has no alpha channel.
///
/// # Errors
///
/// Returns an error if the payload cannot be decoded or encoded.
pub fn encode_jpeg(data: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(data)
        .map_err(|e| ImageError::ImageConversion(format!("Failed to decode image: {e}")))?;
    let rgb = normalize_rgb(img);

    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, image::ImageFormat::Jpeg)
        .map_err(|e| ImageError::ImageConversion(format!("Failed to encode JPEG: {e}")))?;
    Ok(buf.into_inner())
}

fn normalize_rgb(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}
