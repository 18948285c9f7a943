use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbImage};
use tracing::debug;

use crate::{
    error::{GenerationError, Result, StorageError, UploadError},
    imaging::ImageKind,
    styles::PostProcess,
};

/// Decode an upload, convert it to RGB and resize it to a `size`×`size` square
///
/// Aspect ratio is not preserved; the backend expects exactly the working
/// resolution.
pub fn normalize(bytes: &[u8], size: u32) -> Result<RgbImage> {
    let decoded = image::load_from_memory(bytes).map_err(|e| UploadError::DecodeFailed {
        reason: e.to_string(),
    })?;

    let (width, height) = decoded.dimensions();
    debug!("Decoded {}x{} upload ({:?}), resizing to {}x{}",
           width, height, decoded.color(), size, size);

    let rgb = decoded.to_rgb8();
    if rgb.dimensions() == (size, size) {
        return Ok(rgb);
    }

    Ok(image::imageops::resize(&rgb, size, size, FilterType::Lanczos3))
}

/// Apply a style's post-process to the generator output
pub fn apply_post_process(image: DynamicImage, post_process: PostProcess) -> DynamicImage {
    match post_process {
        PostProcess::Passthrough => image,
        PostProcess::Grayscale => DynamicImage::ImageLuma8(image.to_luma8()),
    }
}

/// Encode an image in the given format
///
/// JPEG has no alpha channel, so anything that is not already 8-bit luma or
/// RGB is flattened to RGB first.
pub fn encode(image: &DynamicImage, kind: ImageKind) -> Result<Vec<u8>> {
    let flattened;
    let image = match (kind, image) {
        (ImageKind::Jpeg, DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) => image,
        (ImageKind::Jpeg, other) => {
            flattened = DynamicImage::ImageRgb8(other.to_rgb8());
            &flattened
        }
        (ImageKind::Png, _) => image,
    };

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), kind.output_format())
        .map_err(|e| StorageError::EncodeFailed {
            format: kind.to_string(),
            reason: e.to_string(),
        })?;

    Ok(bytes)
}

/// Decode an image produced by the generation backend
pub fn decode_generated(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| {
        GenerationError::InvalidResponse {
            reason: format!("undecodable image: {}", e),
        }
        .into()
    })
}
