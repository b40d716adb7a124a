//! Format conversion and atomic file writes
//!
//! [`materialize`] turns fetched artifact bytes into a file at the resolved
//! destination: vector output goes through the multi-pass SVG optimizer,
//! raster output is decoded and re-encoded into the requested codec. Writes
//! are atomic from the caller's point of view: the destination either holds
//! the complete content or does not exist.

use crate::ImageFormat;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod raster;
pub mod svg;

/// Conversion failures (encode/decode and write errors)
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Vector output requested for bytes that are not SVG text
    #[error("vector output requires SVG input, got {0}")]
    NotVector(String),

    /// Source bytes could not be decoded as an image
    #[error("failed to decode source image: {0}")]
    Decode(String),

    /// Re-encoding into the target codec failed
    #[error("failed to encode {format} image: {reason}")]
    Encode {
        /// Target format
        format: ImageFormat,
        /// Underlying cause
        reason: String,
    },

    /// Filesystem failure while writing the destination
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying cause
        source: io::Error,
    },
}

/// Result type for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;

/// What the fetched bytes appear to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// SVG text
    Vector,
    /// A known raster container (png, jpeg, webp, gif)
    Raster,
    /// Unrecognized content
    Unknown,
}

/// Sniff the source kind from content, without trusting remote metadata.
pub fn sniff(bytes: &[u8]) -> SourceKind {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G'])
        || bytes.starts_with(&[0xFF, 0xD8, 0xFF])
        || bytes.starts_with(b"GIF8")
        || (bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP")
    {
        return SourceKind::Raster;
    }

    // SVG: text that reaches an <svg tag within the leading markup
    if let Ok(text) = std::str::from_utf8(&bytes[..bytes.len().min(1024)]) {
        if text.trim_start().starts_with('<') && text.contains("<svg") {
            return SourceKind::Vector;
        }
    }

    SourceKind::Unknown
}

/// Convert `bytes` into `format` and write the result to `dest`.
///
/// Returns the destination path on success. Vector output is optimized SVG
/// text written verbatim; raster output is re-encoded at a fixed quality.
pub fn materialize(bytes: &[u8], format: ImageFormat, dest: &Path) -> ConvertResult<PathBuf> {
    let encoded = match format {
        ImageFormat::Svg => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| ConvertError::NotVector("non-UTF-8 payload".to_string()))?;
            if sniff(bytes) != SourceKind::Vector {
                return Err(ConvertError::NotVector(
                    "payload has no <svg> root element".to_string(),
                ));
            }
            svg::optimize(text).into_bytes()
        }
        raster_format => raster::reencode(bytes, raster_format)?,
    };

    write_atomic(dest, &encoded)?;
    debug!(path = %dest.display(), size = encoded.len(), format = %format, "image materialized");
    Ok(dest.to_path_buf())
}

/// Write via temp-file-then-rename so no partial file is ever observable.
fn write_atomic(dest: &Path, bytes: &[u8]) -> ConvertResult<()> {
    let dir = dest.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir),
        None => tempfile::NamedTempFile::new_in("."),
    }
    .map_err(|source| ConvertError::Write {
        path: dest.to_path_buf(),
        source,
    })?;

    tmp.write_all(bytes).map_err(|source| ConvertError::Write {
        path: dest.to_path_buf(),
        source,
    })?;
    tmp.flush().map_err(|source| ConvertError::Write {
        path: dest.to_path_buf(),
        source,
    })?;

    tmp.persist(dest).map_err(|e| ConvertError::Write {
        path: dest.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}
