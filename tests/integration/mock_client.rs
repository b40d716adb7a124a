//! Scripted generation client for pipeline tests

use artforge::client::{ClientError, ClientResult, GenerationClient, GenerationJob, JobStatus};
use artforge::request::ValidatedRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Mock client whose behavior is scripted per test.
///
/// Call counters are atomic so tests can assert exact attempt counts.
pub struct MockClient {
    /// Fail this many submissions with a network error before succeeding
    pub submit_failures: u32,
    /// Report each job as processing for this many polls before completing
    pub pending_polls: u32,
    /// Fail this many downloads with a network error before succeeding
    pub download_failures: u32,
    /// Jobs end in a provider-side failure instead of success
    pub fail_jobs: bool,
    /// Succeeded jobs carry no artifact URL (contract violation)
    pub omit_image_url: bool,
    /// Bytes returned by a successful download
    pub artifact: Vec<u8>,

    /// Number of submit calls observed
    pub submits: AtomicU32,
    /// Number of poll calls observed
    pub polls: AtomicU32,
    /// Number of download calls observed
    pub downloads: AtomicU32,

    poll_counts: Mutex<HashMap<String, u32>>,
}

impl MockClient {
    /// A client that succeeds immediately, producing `artifact` bytes.
    pub fn succeeding(artifact: Vec<u8>) -> Self {
        Self {
            submit_failures: 0,
            pending_polls: 0,
            download_failures: 0,
            fail_jobs: false,
            omit_image_url: false,
            artifact,
            submits: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            downloads: AtomicU32::new(0),
            poll_counts: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl GenerationClient for MockClient {
    async fn submit(&self, request: &ValidatedRequest) -> ClientResult<Vec<GenerationJob>> {
        let call = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.submit_failures {
            return Err(ClientError::Network(format!(
                "simulated submit failure #{call}"
            )));
        }

        Ok((0..request.count)
            .map(|i| GenerationJob {
                id: format!("gen-{i}"),
                status: JobStatus::Pending,
                image_url: None,
            })
            .collect())
    }

    async fn poll(&self, job_id: &str) -> ClientResult<GenerationJob> {
        self.polls.fetch_add(1, Ordering::SeqCst);

        let mut counts = self.poll_counts.lock().unwrap();
        let count = counts.entry(job_id.to_string()).or_insert(0);
        *count += 1;

        if *count <= self.pending_polls {
            return Ok(GenerationJob {
                id: job_id.to_string(),
                status: JobStatus::Processing,
                image_url: None,
            });
        }

        if self.fail_jobs {
            return Ok(GenerationJob {
                id: job_id.to_string(),
                status: JobStatus::Failed,
                image_url: None,
            });
        }

        Ok(GenerationJob {
            id: job_id.to_string(),
            status: JobStatus::Succeeded,
            image_url: (!self.omit_image_url)
                .then(|| format!("https://cdn.test/{job_id}.bin")),
        })
    }

    async fn download(&self, _url: &str) -> ClientResult<Vec<u8>> {
        let call = self.downloads.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.download_failures {
            return Err(ClientError::Network(format!(
                "simulated download failure #{call}"
            )));
        }
        Ok(self.artifact.clone())
    }
}

/// A small well-formed SVG with optimizable clutter.
pub fn sample_svg() -> Vec<u8> {
    concat!(
        "<!-- generator: test -->",
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32">"#,
        r#"<rect width="32" height="32" fill="teal"/></svg>"#
    )
    .as_bytes()
    .to_vec()
}

/// A tiny valid PNG, produced in memory.
pub fn sample_png() -> Vec<u8> {
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    let mut img = RgbaImage::new(2, 2);
    for pixel in img.pixels_mut() {
        *pixel = Rgba([10, 200, 10, 255]);
    }
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
