//! Raster re-encoding
//!
//! Decodes whatever container the remote service returned and re-encodes it
//! into the requested codec in memory. JPEG uses a fixed quality setting and
//! drops any alpha channel; png and webp keep it.

use super::{ConvertError, ConvertResult};
use crate::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;

/// Fixed JPEG quality (0-100).
pub const JPEG_QUALITY: u8 = 90;

/// Decode `bytes` and re-encode into `format`.
pub fn reencode(bytes: &[u8], format: ImageFormat) -> ConvertResult<Vec<u8>> {
    let source =
        image::load_from_memory(bytes).map_err(|e| ConvertError::Decode(e.to_string()))?;

    let mut out = Cursor::new(Vec::new());
    match format {
        ImageFormat::Png => source
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| ConvertError::Encode {
                format,
                reason: e.to_string(),
            })?,
        ImageFormat::Webp => source
            .write_to(&mut out, image::ImageFormat::WebP)
            .map_err(|e| ConvertError::Encode {
                format,
                reason: e.to_string(),
            })?,
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(source.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)
                .map_err(|e| ConvertError::Encode {
                    format,
                    reason: e.to_string(),
                })?;
        }
        ImageFormat::Svg => {
            return Err(ConvertError::Encode {
                format,
                reason: "vector output cannot be encoded from raster input".to_string(),
            });
        }
    }

    Ok(out.into_inner())
}
