//! Remote generation API client
//!
//! [`GenerationClient`] is the seam between the pipeline and the remote
//! service: submit a generation, poll it to a terminal state, download the
//! finished artifact. The production implementation is [`EverArtClient`];
//! tests drive the pipeline through a scripted mock.

use crate::request::ValidatedRequest;
use crate::retry::AttemptFailure;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub mod everart;
pub mod fetch;

pub use everart::EverArtClient;

/// Client errors, tagged at the point of failure.
///
/// The variant carries the classification; callers never re-derive the kind
/// from message text.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Credential rejected by the remote service
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Transport-level failure (connect, timeout, TLS)
    #[error("network error: {0}")]
    Network(String),

    /// Remote service returned a business-logic error
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Remote asked us to slow down (HTTP 429)
    #[error("rate limited by remote service")]
    RateLimited {
        /// Parsed `Retry-After` hint, when the response carried one
        retry_after: Option<Duration>,
    },

    /// Response violated the documented contract
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Classify this failure for the retry executor.
    ///
    /// Auth failures, client errors, and contract violations are permanent;
    /// transport failures and server errors are transient; 429 carries its
    /// hint through.
    pub fn into_attempt(self) -> AttemptFailure<ClientError> {
        match self {
            ClientError::Network(_) => AttemptFailure::Transient(self),
            ClientError::Api { status, .. } if status >= 500 => AttemptFailure::Transient(self),
            ClientError::RateLimited { retry_after } => AttemptFailure::RateLimited {
                retry_after,
                source: self,
            },
            _ => AttemptFailure::Permanent(self),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Lifecycle state of a remote generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepted, not yet started
    Pending,
    /// Generation in progress
    Processing,
    /// Finished; an artifact URL is available
    Succeeded,
    /// Permanently failed on the provider side
    Failed,
    /// Canceled on the provider side
    Canceled,
}

impl JobStatus {
    /// Whether polling should stop at this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        };
        write!(f, "{s}")
    }
}

/// One remote generation job, owned by the client for the duration of a
/// single request and discarded after pipeline completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Remote-assigned identifier
    pub id: String,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Artifact URL, present once the job succeeded
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Interface to the remote generation provider.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Submit a text-to-image generation; returns one job per requested image.
    async fn submit(&self, request: &ValidatedRequest) -> ClientResult<Vec<GenerationJob>>;

    /// Fetch the current state of a job.
    async fn poll(&self, job_id: &str) -> ClientResult<GenerationJob>;

    /// Download the raw bytes of a finished artifact.
    async fn download(&self, url: &str) -> ClientResult<Vec<u8>>;
}
