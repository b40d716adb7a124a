//! Request parsing, normalization, and validation
//!
//! A [`GenerationRequest`] is the raw shape deserialized at the tool
//! boundary. [`validate`] turns it into a [`ValidatedRequest`] or a typed
//! [`ValidationError`]; nothing past this module sees an unchecked request.
//! Validation is pure: no filesystem or network access.

use crate::models::{self, ModelDescriptor};
use crate::ImageFormat;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Lower bound for the per-request image count.
pub const MIN_IMAGE_COUNT: u32 = 1;

/// Upper bound for the per-request image count.
pub const MAX_IMAGE_COUNT: u32 = 10;

/// Raw generation request as received from a tool call.
///
/// Unknown fields are rejected at deserialization so malformed shapes fail at
/// the boundary instead of deep inside the pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationRequest {
    /// Free-text prompt describing the desired image
    pub prompt: String,
    /// Model identifier, optionally suffixed with a display label
    /// (`"8000"` or `"8000:Recraft-Vector"`)
    #[serde(default = "default_model")]
    pub model: String,
    /// Requested output format; resolved from the model when absent
    #[serde(default)]
    pub format: Option<String>,
    /// Number of images to generate
    #[serde(default = "default_count")]
    pub count: u32,
    /// Explicit destination path; overrides all path generation
    #[serde(default)]
    pub output_path: Option<String>,
    /// Project root to store the image under a conventional asset directory
    #[serde(default)]
    pub project_path: Option<String>,
    /// Project kind tag used to pick the asset directory convention
    #[serde(default)]
    pub project_kind: Option<String>,
    /// Explicit asset subdirectory, overriding the project-kind convention
    #[serde(default)]
    pub asset_subpath: Option<String>,
}

fn default_model() -> String {
    "5000".to_string()
}

fn default_count() -> u32 {
    1
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: default_model(),
            format: None,
            count: default_count(),
            output_path: None,
            project_path: None,
            project_kind: None,
            asset_subpath: None,
        }
    }
}

/// Project storage target extracted from a validated request.
#[derive(Debug, Clone)]
pub struct ProjectTarget {
    /// Project root directory
    pub base: PathBuf,
    /// Project kind tag (`react`, `vue`, ...), lowercased
    pub kind: Option<String>,
    /// Explicit asset subdirectory relative to the project root
    pub subpath: Option<String>,
}

/// A request that passed validation: bare model id resolved against the model
/// table, format normalized, count within bounds.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// Trimmed prompt text
    pub prompt: String,
    /// Resolved model descriptor
    pub model: &'static ModelDescriptor,
    /// Normalized output format
    pub format: ImageFormat,
    /// Image count in `[MIN_IMAGE_COUNT, MAX_IMAGE_COUNT]`
    pub count: u32,
    /// Explicit destination path, if given
    pub output_path: Option<PathBuf>,
    /// Project storage target, if a project path was given
    pub project: Option<ProjectTarget>,
}

/// Validation failures (pure, recoverable by correcting the request)
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Prompt missing or whitespace-only
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// Count outside the allowed range
    #[error("count must be between {MIN_IMAGE_COUNT} and {MAX_IMAGE_COUNT}, got {0}")]
    InvalidCount(u32),

    /// Model id not in the fixed model set
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Format string not recognized
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Vector format requested for a model that cannot produce it
    #[error("format {format} is only supported by model {vector_model}, not {model}")]
    IncompatibleFormat {
        /// Requested format
        format: ImageFormat,
        /// Model that was asked for it
        model: String,
        /// The one model that supports vector output
        vector_model: &'static str,
    },
}

/// Validate a raw request into a [`ValidatedRequest`].
///
/// Model ids may arrive as `"<id>:<label>"`; the label is discarded and the
/// bare id is checked against the fixed model set. An absent format resolves
/// to svg for the vector-capable model and png otherwise.
pub fn validate(request: &GenerationRequest) -> Result<ValidatedRequest, ValidationError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }

    if !(MIN_IMAGE_COUNT..=MAX_IMAGE_COUNT).contains(&request.count) {
        return Err(ValidationError::InvalidCount(request.count));
    }

    let bare_id = bare_model_id(&request.model);
    let model = models::lookup(bare_id)
        .ok_or_else(|| ValidationError::UnknownModel(request.model.clone()))?;

    let format = match request.format.as_deref() {
        Some(raw) => ImageFormat::from_str(raw)
            .map_err(|_| ValidationError::UnsupportedFormat(raw.to_string()))?,
        None if model.vector_capable => ImageFormat::Svg,
        None => ImageFormat::Png,
    };

    ensure_format_compatible(model, format)?;

    let project = request.project_path.as_deref().map(|base| ProjectTarget {
        base: PathBuf::from(base),
        kind: request.project_kind.as_deref().map(str::to_ascii_lowercase),
        subpath: request.asset_subpath.clone(),
    });

    Ok(ValidatedRequest {
        prompt: prompt.to_string(),
        model,
        format,
        count: request.count,
        output_path: request.output_path.as_deref().map(PathBuf::from),
        project,
    })
}

/// Check that a format is legal for a model.
///
/// Runs at validation time and again immediately before conversion; the two
/// call sites must not diverge.
pub fn ensure_format_compatible(
    model: &ModelDescriptor,
    format: ImageFormat,
) -> Result<(), ValidationError> {
    if format.is_vector() && !model.vector_capable {
        return Err(ValidationError::IncompatibleFormat {
            format,
            model: model.id.to_string(),
            vector_model: models::VECTOR_MODEL_ID,
        });
    }
    Ok(())
}

/// Strip an optional `:<label>` suffix from a model identifier.
fn bare_model_id(model: &str) -> &str {
    match model.split_once(':') {
        Some((id, _label)) => id.trim(),
        None => model.trim(),
    }
}
