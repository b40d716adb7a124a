//! End-to-end pipeline scenarios against a scripted client

use super::mock_client::{sample_png, sample_svg, MockClient};
use artforge::pipeline::{ErrorKind, GenerationPipeline};
use artforge::request::GenerationRequest;
use artforge::retry::RetryPolicy;
use artforge::storage::StorageLayout;
use artforge::ImageFormat;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::TempDir;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1), 2.0)
}

fn pipeline_with(client: MockClient, dir: &TempDir) -> GenerationPipeline<MockClient> {
    GenerationPipeline::new(client, StorageLayout::new(dir.path().join("store")))
        .with_submit_policy(fast_policy(5))
        .with_fetch_policy(fast_policy(5))
        .with_poll_interval(Duration::from_millis(1))
}

fn request(prompt: &str, model: &str) -> GenerationRequest {
    GenerationRequest {
        prompt: prompt.to_string(),
        model: model.to_string(),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_vector_model_defaults_to_optimized_svg() {
    // No explicit format: the vector-capable model resolves to svg
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(MockClient::succeeding(sample_svg()), &dir);

    let outcome = pipeline
        .run(&request("A minimalist tech logo", "8000"))
        .await
        .unwrap();

    assert_eq!(outcome.format, ImageFormat::Svg);
    assert_eq!(outcome.model_name, "Recraft-Vector");
    let path = outcome.primary_path();
    assert_eq!(path.extension().unwrap(), "svg");

    let stored = std::fs::read_to_string(path).unwrap();
    assert!(!stored.contains("<!--"), "comments should be optimized away");
    assert!(stored.contains(r#"viewBox="0 0 32 32""#));
}

#[tokio::test(start_paused = true)]
async fn test_vector_format_on_raster_model_fails_before_any_network_call() {
    // An incompatible format never reaches the client
    let dir = TempDir::new().unwrap();
    let client = MockClient::succeeding(sample_svg());

    let mut req = request("A landscape", "5000");
    req.format = Some("vector".to_string());

    let pipeline = pipeline_with(client, &dir);
    let err = pipeline.run(&req).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(pipeline_client(&pipeline).submits.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline_client(&pipeline).polls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_submission_retries_then_succeeds() {
    let dir = TempDir::new().unwrap();
    let mut client = MockClient::succeeding(sample_png());
    client.submit_failures = 2;

    let pipeline = pipeline_with(client, &dir);
    let outcome = pipeline.run(&request("A landscape", "5000")).await.unwrap();

    assert_eq!(outcome.paths.len(), 1);
    assert_eq!(pipeline_client(&pipeline).submits.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_submission_exhausts_retry_budget() {
    let dir = TempDir::new().unwrap();
    let mut client = MockClient::succeeding(sample_png());
    client.submit_failures = 99;

    let pipeline = GenerationPipeline::new(
        client,
        StorageLayout::new(dir.path().join("store")),
    )
    .with_submit_policy(fast_policy(3))
    .with_poll_interval(Duration::from_millis(1));

    let err = pipeline.run(&request("A landscape", "5000")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.to_string().contains("exhausted after 3 attempts"));
    assert_eq!(pipeline_client(&pipeline).submits.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_download_retries_independently_of_submission() {
    let dir = TempDir::new().unwrap();
    let mut client = MockClient::succeeding(sample_png());
    client.submit_failures = 2;
    client.download_failures = 2;

    let pipeline = pipeline_with(client, &dir);
    let outcome = pipeline.run(&request("A landscape", "5000")).await.unwrap();

    assert!(outcome.primary_path().exists());
    // Each budget is consumed separately
    assert_eq!(pipeline_client(&pipeline).submits.load(Ordering::SeqCst), 3);
    assert_eq!(pipeline_client(&pipeline).downloads.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_provider_side_failure_maps_to_api_error() {
    let dir = TempDir::new().unwrap();
    let mut client = MockClient::succeeding(sample_png());
    client.fail_jobs = true;

    let pipeline = pipeline_with(client, &dir);
    let err = pipeline.run(&request("A landscape", "5000")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
}

#[tokio::test(start_paused = true)]
async fn test_missing_artifact_url_is_contract_violation() {
    let dir = TempDir::new().unwrap();
    let mut client = MockClient::succeeding(sample_png());
    client.omit_image_url = true;

    let pipeline = pipeline_with(client, &dir);
    let err = pipeline.run(&request("A landscape", "5000")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert!(err.to_string().contains("without an artifact URL"));
}

#[tokio::test(start_paused = true)]
async fn test_poll_ceiling_times_out() {
    let dir = TempDir::new().unwrap();
    let mut client = MockClient::succeeding(sample_png());
    client.pending_polls = 999;

    let pipeline = pipeline_with(client, &dir).with_max_poll_attempts(4);
    let err = pipeline.run(&request("A landscape", "5000")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(pipeline_client(&pipeline).polls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_polling_waits_before_completion() {
    let dir = TempDir::new().unwrap();
    let mut client = MockClient::succeeding(sample_png());
    client.pending_polls = 3;

    let pipeline = pipeline_with(client, &dir);
    let outcome = pipeline.run(&request("A landscape", "5000")).await.unwrap();

    assert!(outcome.primary_path().exists());
    assert_eq!(pipeline_client(&pipeline).polls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_multi_image_request_stores_numbered_files() {
    let dir = TempDir::new().unwrap();
    let client = MockClient::succeeding(sample_png());

    let mut req = request("Three cats", "5000");
    req.count = 3;

    let pipeline = pipeline_with(client, &dir);
    let outcome = pipeline.run(&req).await.unwrap();

    assert_eq!(outcome.paths.len(), 3);
    for path in &outcome.paths {
        assert!(path.exists(), "{} should exist", path.display());
    }
    let second = outcome.paths[1].file_name().unwrap().to_string_lossy();
    assert!(second.ends_with("-2.png"), "got {second}");
}

#[tokio::test(start_paused = true)]
async fn test_project_outcome_reports_relative_path() {
    let dir = TempDir::new().unwrap();
    let client = MockClient::succeeding(sample_png());

    let mut req = request("App icon", "5000");
    req.project_path = Some(dir.path().to_string_lossy().into_owned());
    req.project_kind = Some("react".to_string());

    let pipeline = pipeline_with(client, &dir);
    let outcome = pipeline.run(&req).await.unwrap();

    let relative = outcome.project_relative.as_ref().expect("path is under the project base");
    assert!(relative.starts_with("public/images"));
    assert!(outcome.primary_path().starts_with(dir.path()));
}

#[tokio::test(start_paused = true)]
async fn test_raster_artifact_reencoded_to_requested_codec() {
    let dir = TempDir::new().unwrap();
    let client = MockClient::succeeding(sample_png());

    let mut req = request("A landscape", "5000");
    req.format = Some("jpeg".to_string());

    let pipeline = pipeline_with(client, &dir);
    let outcome = pipeline.run(&req).await.unwrap();

    let bytes = std::fs::read(outcome.primary_path()).unwrap();
    assert!(bytes.starts_with(&[0xFF, 0xD8, 0xFF]), "expected JPEG magic");
    assert_eq!(outcome.primary_path().extension().unwrap(), "jpg");
}

/// Access the injected client for counter assertions.
fn pipeline_client(pipeline: &GenerationPipeline<MockClient>) -> &MockClient {
    pipeline.client()
}
