//! EverArt HTTP client
//!
//! Thin reqwest-based implementation of [`GenerationClient`] against the
//! EverArt v1 API. Retry decisions live in [`crate::retry`]; this module only
//! tags failures with their kind at the point they occur.

use super::{ClientError, ClientResult, GenerationClient, GenerationJob};
use crate::pipeline::config::REQUEST_TIMEOUT;
use crate::request::ValidatedRequest;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.everart.ai";

/// Generated image edge length in pixels.
const IMAGE_DIMENSION: u32 = 1024;

/// HTTP client for the EverArt generation API.
pub struct EverArtClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Wire body for a generation submission.
#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    prompt: &'a str,
    #[serde(rename = "type")]
    mode: &'a str,
    image_count: u32,
    height: u32,
    width: u32,
}

/// Response envelope for a submission.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    generations: Vec<GenerationJob>,
}

/// Response envelope for a poll.
#[derive(Debug, Deserialize)]
struct PollResponse {
    generation: GenerationJob,
}

impl EverArtClient {
    /// Create a client presenting `api_key` as a bearer credential.
    ///
    /// # Errors
    /// Returns [`ClientError::Network`] if the underlying HTTP client cannot
    /// be constructed; callers treat this as a startup failure.
    pub fn new(api_key: String) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Override the API endpoint (used against test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Map a non-success response to a tagged [`ClientError`].
    async fn error_for(response: Response) -> ClientError {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(&response);
            return ClientError::RateLimited { retry_after };
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = body_or_reason(response).await;
            return ClientError::Auth(message);
        }

        let message = body_or_reason(response).await;
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Extract a `Retry-After` hint in seconds, when present and parseable.
fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Response body text, falling back to the status reason.
async fn body_or_reason(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

#[async_trait]
impl GenerationClient for EverArtClient {
    async fn submit(&self, request: &ValidatedRequest) -> ClientResult<Vec<GenerationJob>> {
        let url = format!("{}/v1/models/{}/generations", self.base_url, request.model.id);
        let body = SubmitBody {
            prompt: &request.prompt,
            mode: "txt2img",
            image_count: request.count,
            height: IMAGE_DIMENSION,
            width: IMAGE_DIMENSION,
        };

        debug!(model = request.model.id, count = request.count, "submitting generation");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("submission response: {e}")))?;

        Ok(parsed.generations)
    }

    async fn poll(&self, job_id: &str) -> ClientResult<GenerationJob> {
        let url = format!("{}/v1/generations/{}", self.base_url, job_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let parsed: PollResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("poll response: {e}")))?;

        Ok(parsed.generation)
    }

    async fn download(&self, url: &str) -> ClientResult<Vec<u8>> {
        // Artifact URLs are pre-signed; no credential is attached.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(&response);
            return Err(ClientError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = body_or_reason(response).await;
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if bytes.is_empty() {
            return Err(ClientError::InvalidResponse(
                "artifact download returned an empty body".to_string(),
            ));
        }

        Ok(bytes.to_vec())
    }
}
