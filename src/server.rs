//! Tool protocol server
//!
//! Exposes three tools over a line-delimited JSON protocol on stdio:
//! `generate_image`, `list_images`, and `view_image`. Requests are parsed
//! into typed structures at the boundary; malformed payloads and pipeline
//! failures become structured error responses, and no single request can
//! take down the serve loop.

use crate::client::GenerationClient;
use crate::pipeline::GenerationPipeline;
use crate::request::GenerationRequest;
use crate::storage::StorageLayout;
use crate::viewer;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

/// One inbound tool invocation.
#[derive(Debug, Deserialize)]
#[serde(tag = "tool", content = "params", rename_all = "snake_case")]
pub enum ToolRequest {
    /// Generate images and store them
    GenerateImage(GenerationRequest),
    /// List stored images grouped by extension
    ListImages,
    /// Open a stored image in the platform viewer
    ViewImage {
        /// Filename within the storage directory
        filename: String,
    },
}

/// One outbound tool result.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse {
    /// Success, with human-readable text and optional structured data
    Ok {
        /// Human-readable description of what happened
        text: String,
        /// Structured result payload
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    /// Failure, with a machine-checkable kind
    Error {
        /// Taxonomy tag (`validation`, `network`, `not_found`, ...)
        kind: String,
        /// Human-readable message
        message: String,
        /// Fuzzy filename suggestions for not-found lookups
        #[serde(skip_serializing_if = "Vec::is_empty")]
        suggestions: Vec<String>,
    },
}

impl ToolResponse {
    fn ok(text: String, data: Option<serde_json::Value>) -> Self {
        ToolResponse::Ok { text, data }
    }

    fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ToolResponse::Error {
            kind: kind.into(),
            message: message.into(),
            suggestions: Vec::new(),
        }
    }
}

/// Tool dispatcher bound to one pipeline and storage layout.
pub struct ToolServer<C> {
    pipeline: GenerationPipeline<C>,
    storage: StorageLayout,
}

impl<C: GenerationClient> ToolServer<C> {
    /// Create a server around an already-constructed pipeline.
    pub fn new(pipeline: GenerationPipeline<C>, storage: StorageLayout) -> Self {
        Self { pipeline, storage }
    }

    /// Handle one raw protocol line.
    pub async fn handle_line(&self, line: &str) -> ToolResponse {
        let request: ToolRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => return ToolResponse::error("bad_request", format!("malformed request: {e}")),
        };
        self.handle(request).await
    }

    /// Dispatch one parsed tool request.
    pub async fn handle(&self, request: ToolRequest) -> ToolResponse {
        match request {
            ToolRequest::GenerateImage(request) => self.generate(&request).await,
            ToolRequest::ListImages => self.list(),
            ToolRequest::ViewImage { filename } => self.view(&filename),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> ToolResponse {
        match self.pipeline.run(request).await {
            Ok(outcome) => {
                let mut text = format!(
                    "Generated {} {} image(s) with {}\nPrompt: {}\nStored at: {}",
                    outcome.paths.len(),
                    outcome.format,
                    outcome.model_name,
                    outcome.prompt,
                    outcome.primary_path().display(),
                );
                if let Some(relative) = &outcome.project_relative {
                    text.push_str(&format!("\nIn project: {}", relative.display()));
                }
                let data = serde_json::to_value(&outcome).ok();
                ToolResponse::ok(text, data)
            }
            Err(e) => ToolResponse::error(e.kind().to_string(), e.to_string()),
        }
    }

    fn list(&self) -> ToolResponse {
        match self.storage.list_stored() {
            Ok(grouped) if grouped.is_empty() => {
                ToolResponse::ok("No stored images.".to_string(), None)
            }
            Ok(grouped) => {
                let mut text = String::new();
                for (ext, names) in &grouped {
                    text.push_str(&format!("{ext}:\n"));
                    for name in names {
                        text.push_str(&format!("  {name}\n"));
                    }
                }
                let data = serde_json::to_value(&grouped).ok();
                ToolResponse::ok(text.trim_end().to_string(), data)
            }
            Err(e) => ToolResponse::error("storage", e.to_string()),
        }
    }

    fn view(&self, filename: &str) -> ToolResponse {
        match self.storage.find(filename) {
            Some(path) => {
                viewer::open(&path);
                ToolResponse::ok(format!("Opening {}", path.display()), None)
            }
            None => {
                let suggestions = self.storage.suggestions(filename);
                let message = if suggestions.is_empty() {
                    format!("no stored image named {filename}")
                } else {
                    format!(
                        "no stored image named {filename}; did you mean: {}?",
                        suggestions.join(", ")
                    )
                };
                ToolResponse::Error {
                    kind: "not_found".to_string(),
                    message,
                    suggestions,
                }
            }
        }
    }

    /// Serve requests from stdin until EOF, one JSON document per line.
    ///
    /// Responses go to stdout; logging stays on stderr. A failed request
    /// produces an error response and the loop continues.
    pub async fn serve(&self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut lines = stdin.lines();

        info!("serving tool requests on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line).await;
            let payload = match serde_json::to_string(&response) {
                Ok(payload) => payload,
                Err(e) => {
                    // Response serialization failing is a bug, not a request error
                    error!(error = %e, "failed to serialize tool response");
                    continue;
                }
            };

            stdout.write_all(payload.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        info!("stdin closed; shutting down");
        Ok(())
    }
}
