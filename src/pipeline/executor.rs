//! Pipeline executor
//!
//! Orchestrates one generation request end to end. The client is injected at
//! construction and the executor is reusable across requests; every request
//! owns its own job ids, retry counters, and destination paths, so concurrent
//! invocations never share mutable state.

use crate::client::fetch::fetch_artifact;
use crate::client::{GenerationClient, GenerationJob, JobStatus};
use crate::convert;
use crate::pipeline::config;
use crate::pipeline::{GenerationOutcome, PipelineError};
use crate::request::{self, GenerationRequest, ValidatedRequest};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::storage::StorageLayout;
use crate::viewer;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// End-to-end generation pipeline.
pub struct GenerationPipeline<C> {
    client: C,
    storage: StorageLayout,
    submit_policy: RetryPolicy,
    fetch_policy: RetryPolicy,
    poll_interval: Duration,
    max_poll_attempts: u32,
    open_after_store: bool,
}

impl<C: GenerationClient> GenerationPipeline<C> {
    /// Create a pipeline with the default retry and polling configuration.
    pub fn new(client: C, storage: StorageLayout) -> Self {
        Self {
            client,
            storage,
            submit_policy: config::submit_policy(),
            fetch_policy: config::fetch_policy(),
            poll_interval: config::POLL_INTERVAL,
            max_poll_attempts: config::MAX_POLL_ATTEMPTS,
            open_after_store: false,
        }
    }

    /// Override the submission retry schedule.
    pub fn with_submit_policy(mut self, policy: RetryPolicy) -> Self {
        self.submit_policy = policy;
        self
    }

    /// Override the artifact download retry schedule.
    pub fn with_fetch_policy(mut self, policy: RetryPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the poll attempt ceiling.
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts.max(1);
        self
    }

    /// Open the first stored image in the platform viewer after success.
    /// Viewer failures are logged and never fail the pipeline.
    pub fn with_viewer(mut self, open_after_store: bool) -> Self {
        self.open_after_store = open_after_store;
        self
    }

    /// The injected generation client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run one generation request to completion.
    ///
    /// # Errors
    /// Every failure is classified into exactly one [`PipelineError`] kind at
    /// the point it occurs.
    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationOutcome, PipelineError> {
        // Validating
        let validated = request::validate(request)?;
        info!(
            model = validated.model.id,
            format = %validated.format,
            count = validated.count,
            "request validated"
        );

        // Submitting
        let jobs = run_with_retry(&self.submit_policy, || async {
            self.client
                .submit(&validated)
                .await
                .map_err(crate::client::ClientError::into_attempt)
        })
        .await?;

        if jobs.is_empty() {
            return Err(PipelineError::Api(
                "provider accepted the submission but returned no jobs".to_string(),
            ));
        }
        info!(jobs = jobs.len(), "generation submitted");

        // Polling → Fetching → Converting, per job
        let mut paths = Vec::with_capacity(jobs.len());
        for (index, job) in jobs.iter().enumerate() {
            let path = self.materialize_job(&validated, job, index as u32).await?;
            paths.push(path);
        }

        let project_relative = validated.project.as_ref().and_then(|project| {
            paths
                .first()
                .and_then(|p| p.strip_prefix(&project.base).ok())
                .map(|p| p.to_path_buf())
        });

        let outcome = GenerationOutcome {
            paths,
            model_name: validated.model.display_name.to_string(),
            prompt: validated.prompt.clone(),
            format: validated.format,
            project_relative,
        };

        // Done
        info!(path = %outcome.primary_path().display(), "generation complete");
        if self.open_after_store {
            viewer::open(outcome.primary_path());
        }

        Ok(outcome)
    }

    /// Poll one job to completion, download its artifact, and store it.
    async fn materialize_job(
        &self,
        validated: &ValidatedRequest,
        job: &GenerationJob,
        index: u32,
    ) -> Result<PathBuf, PipelineError> {
        let completed = self.poll_to_completion(&job.id).await?;

        let url = completed.image_url.ok_or_else(|| {
            PipelineError::Api(format!(
                "generation {} succeeded without an artifact URL",
                completed.id
            ))
        })?;

        let bytes = fetch_artifact(&self.client, &url, &self.fetch_policy).await?;

        // The validator already checked this; the two call sites must not diverge.
        request::ensure_format_compatible(validated.model, validated.format)?;

        let dest = self.storage.resolve(validated, index)?;
        let path = convert::materialize(&bytes, validated.format, &dest)?;
        info!(job = %completed.id, path = %path.display(), "image stored");
        Ok(path)
    }

    /// Poll a job at a fixed interval until it reaches a terminal state or
    /// the attempt ceiling is hit.
    async fn poll_to_completion(&self, job_id: &str) -> Result<GenerationJob, PipelineError> {
        for attempt in 0..self.max_poll_attempts {
            let job = self.client.poll(job_id).await.map_err(PipelineError::from)?;

            match job.status {
                JobStatus::Succeeded => {
                    debug!(job = job_id, attempt = attempt + 1, "job succeeded");
                    return Ok(job);
                }
                JobStatus::Failed | JobStatus::Canceled => {
                    warn!(job = job_id, status = %job.status, "job reached failed state");
                    return Err(PipelineError::Api(format!(
                        "generation {job_id} reported terminal state: {}",
                        job.status
                    )));
                }
                JobStatus::Pending | JobStatus::Processing => {
                    debug!(
                        job = job_id,
                        attempt = attempt + 1,
                        max_attempts = self.max_poll_attempts,
                        "job still in progress"
                    );
                    if attempt + 1 < self.max_poll_attempts {
                        sleep(self.poll_interval).await;
                    }
                }
            }
        }

        Err(PipelineError::Timeout(self.max_poll_attempts))
    }
}
