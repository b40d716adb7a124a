//! Generation pipeline orchestration
//!
//! The pipeline drives one request through
//! `Validating → Submitting → Polling → Fetching → Converting → Done`, with a
//! terminal `Failed` reachable from every state. Each failure is classified
//! into exactly one [`ErrorKind`] at the point it occurs; retry decisions
//! happen earlier, inside [`crate::retry`], and never depend on the
//! classification.
//!
//! # Quick Start
//!
//! ```no_run
//! use artforge::client::EverArtClient;
//! use artforge::pipeline::GenerationPipeline;
//! use artforge::request::GenerationRequest;
//! use artforge::storage::StorageLayout;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EverArtClient::new("api-key".to_string())?;
//! let pipeline = GenerationPipeline::new(client, StorageLayout::new("./images"));
//! let outcome = pipeline
//!     .run(&GenerationRequest {
//!         prompt: "A watercolor fox".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::client::ClientError;
use crate::convert::ConvertError;
use crate::request::ValidationError;
use crate::retry::RetryError;
use crate::storage::StorageError;
use crate::ImageFormat;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod config;
pub mod executor;

pub use executor::GenerationPipeline;

/// Machine-checkable failure taxonomy surfaced in tool responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Bad input; recoverable by correcting the request
    Validation,
    /// Credential rejected
    Auth,
    /// Transport/connectivity failure
    Network,
    /// Remote service business-logic error (including rate limits)
    Api,
    /// Filesystem failure
    Storage,
    /// Encode/decode failure
    Format,
    /// Poll ceiling reached without a terminal job state
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Auth => "auth",
            ErrorKind::Network => "network",
            ErrorKind::Api => "api",
            ErrorKind::Storage => "storage",
            ErrorKind::Format => "format",
            ErrorKind::Timeout => "timeout",
        };
        write!(f, "{s}")
    }
}

/// Pipeline failures
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Request rejected before any network call
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Credential rejected by the remote service
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Remote service returned a business-logic error
    #[error("API error: {0}")]
    Api(String),

    /// Filesystem failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Encode/decode failure
    #[error("format error: {0}")]
    Format(#[from] ConvertError),

    /// Job did not reach a terminal state within the poll ceiling
    #[error("generation timed out after {0} poll attempts")]
    Timeout(u32),
}

impl PipelineError {
    /// The taxonomy kind of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Auth(_) => ErrorKind::Auth,
            PipelineError::Network(_) => ErrorKind::Network,
            PipelineError::Api(_) => ErrorKind::Api,
            PipelineError::Storage(_) => ErrorKind::Storage,
            PipelineError::Format(_) => ErrorKind::Format,
            PipelineError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

impl From<ClientError> for PipelineError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Auth(msg) => PipelineError::Auth(msg),
            ClientError::Network(msg) => PipelineError::Network(msg),
            other => PipelineError::Api(other.to_string()),
        }
    }
}

impl From<RetryError<ClientError>> for PipelineError {
    fn from(err: RetryError<ClientError>) -> Self {
        match err {
            RetryError::Permanent(inner) => inner.into(),
            RetryError::Exhausted { attempts, last } => {
                let message = format!("retries exhausted after {attempts} attempts: {last}");
                match last {
                    ClientError::Auth(_) => PipelineError::Auth(message),
                    ClientError::Network(_) => PipelineError::Network(message),
                    _ => PipelineError::Api(message),
                }
            }
        }
    }
}

/// Successful pipeline result.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    /// Stored file paths, one per generated image
    pub paths: Vec<PathBuf>,
    /// Display name of the model that produced the images
    pub model_name: String,
    /// Echoed prompt
    pub prompt: String,
    /// Format the images were stored in
    pub format: ImageFormat,
    /// First stored path relative to the project base, when the request
    /// carried a project base that prefixes it
    pub project_relative: Option<PathBuf>,
}

impl GenerationOutcome {
    /// The first (primary) stored path.
    ///
    /// The pipeline never constructs an outcome with zero paths.
    pub fn primary_path(&self) -> &Path {
        self.paths
            .first()
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(""))
    }
}
