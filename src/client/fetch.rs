//! Artifact download with a bounded retry budget
//!
//! One GET operation handed to the retry executor. The request timeout lives
//! on the shared HTTP client; rate-limit hints from the download endpoint are
//! honored by the executor.

use super::{ClientError, GenerationClient};
use crate::retry::{run_with_retry, RetryError, RetryPolicy};
use tracing::debug;

/// Download a finished artifact's bytes, retrying transient failures.
///
/// Each call gets its own attempt budget, independent of the submission
/// retry. Non-429 error statuses are permanent and not retried.
pub async fn fetch_artifact<C>(
    client: &C,
    url: &str,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, RetryError<ClientError>>
where
    C: GenerationClient + ?Sized,
{
    let bytes = run_with_retry(policy, || async {
        client.download(url).await.map_err(ClientError::into_attempt)
    })
    .await?;

    debug!(url, size = bytes.len(), "artifact downloaded");
    Ok(bytes)
}
