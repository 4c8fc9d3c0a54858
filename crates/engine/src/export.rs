use core_types::PixelBuffer;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use tracing::debug;

use crate::{EngineError, Result};

pub fn decode_source(bytes: &[u8]) -> Result<PixelBuffer> {
    let dyn_img =
        image::load_from_memory(bytes).map_err(|e| EngineError::SourceImageInvalid(e.to_string()))?;

    let rgba = dyn_img.to_rgba8();
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return Err(EngineError::SourceImageInvalid(format!(
            "image has no pixels ({w}x{h})"
        )));
    }
    debug!("decoded source image {w}x{h}");
    Ok(PixelBuffer::from_raw(w, h, rgba.into_raw()))
}

/// Lossless, alpha-preserving encoding of the final raster.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut out,
        CompressionType::Default,
        FilterType::Adaptive,
    );
    encoder
        .write_image(
            buffer.as_bytes(),
            buffer.width(),
            buffer.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EngineError::Encode(format!("Failed to encode PNG: {e}")))?;
    Ok(out)
}
