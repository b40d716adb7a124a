//! # Artforge Library
//!
//! A bridge between image-generation tool calls and files on disk. Requests
//! are validated, submitted to the EverArt generation API, polled to
//! completion, downloaded, converted into the requested format, and written
//! to a deterministically resolved path.
//!
//! ## Features
//!
//! - **Validated Requests**: strongly-typed request structure built once at
//!   the boundary, with model/format compatibility checks before any network
//!   call
//! - **Bounded Retries**: exponential backoff around job submission and
//!   artifact download, honoring rate-limit hints from the remote service
//! - **Completion Polling**: fixed-interval job polling with a bounded
//!   attempt ceiling
//! - **Format Conversion**: multi-pass SVG optimization for vector output,
//!   raster re-encoding (png/jpeg/webp) for everything else
//! - **Atomic Storage**: files appear fully written or not at all
//!
//! ## Quick Start
//!
//! ```no_run
//! use artforge::client::EverArtClient;
//! use artforge::pipeline::GenerationPipeline;
//! use artforge::request::GenerationRequest;
//! use artforge::storage::StorageLayout;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EverArtClient::new("api-key".to_string())?;
//! let storage = StorageLayout::new("./images");
//! let pipeline = GenerationPipeline::new(client, storage);
//!
//! let request = GenerationRequest {
//!     prompt: "A minimalist tech logo".to_string(),
//!     model: "8000".to_string(),
//!     ..Default::default()
//! };
//!
//! let outcome = pipeline.run(&request).await?;
//! println!("stored at {}", outcome.primary_path().display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - [`request`] - Request parsing, normalization, and validation
//! - [`models`] - The fixed set of generation models and their capabilities
//! - [`retry`] - Bounded exponential-backoff retry for fallible operations
//! - [`client`] - Remote generation API client (submit, poll, download)
//! - [`convert`] - Format conversion and atomic writes
//! - [`storage`] - Destination path resolution and stored-image listing
//! - [`pipeline`] - Orchestration of the full generation workflow
//! - [`server`] - Line-delimited JSON tool protocol over stdio

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Remote generation API client
pub mod client;

/// Format conversion and atomic file writes
pub mod convert;

/// Generation model descriptors
pub mod models;

/// Generation pipeline orchestration
pub mod pipeline;

/// Request types and validation
pub mod request;

/// Bounded retry with exponential backoff
pub mod retry;

/// Tool protocol server
pub mod server;

/// Destination path resolution and stored-image queries
pub mod storage;

/// Best-effort image viewer integration
pub mod viewer;

// Re-export commonly used types
pub use pipeline::{GenerationOutcome, GenerationPipeline, PipelineError};
pub use request::{GenerationRequest, ValidatedRequest};

/// Target encoding for a stored image.
///
/// `Svg` is the single vector format; the raster formats are re-encoded from
/// whatever the remote service returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Structured vector graphic, stored as optimized SVG text
    Svg,
    /// Portable Network Graphics
    Png,
    /// JPEG at a fixed quality setting
    Jpeg,
    /// WebP
    Webp,
}

impl ImageFormat {
    /// File extension for this format, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }

    /// Whether this format is the vector format.
    pub fn is_vector(&self) -> bool {
        matches!(self, ImageFormat::Svg)
    }

    /// Whether a filename extension already matches this format.
    ///
    /// Case-insensitive; accepts both `jpg` and `jpeg` for [`ImageFormat::Jpeg`].
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        match self {
            ImageFormat::Jpeg => ext == "jpg" || ext == "jpeg",
            other => ext == other.extension(),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" | "vector" => Ok(ImageFormat::Svg),
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(format!("unsupported format: {other}")),
        }
    }
}
