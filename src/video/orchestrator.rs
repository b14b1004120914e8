//! Submit a job, poll it to completion, download the result.

use crate::asset::ImagePayload;
use crate::credential::Credential;
use crate::error::{MotionError, Result};
use crate::video::progress::{ProgressFn, ProgressTicker};
use crate::video::service::VideoService;
use crate::video::types::{GeneratedVideo, GenerationJob, GenerationOptions, JobRequest, VideoMetadata};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

const MSG_INITIATING: &str = "Initiating video generation...";
const MSG_PROCESSING: &str = "Processing your request... this can take a minute or two.";
const MSG_DOWNLOADING: &str = "Downloading your video...";

/// Builder for JobOrchestrator.
#[derive(Debug, Clone)]
pub struct JobOrchestratorBuilder<S> {
    service: S,
    poll_interval: Duration,
    progress_interval: Duration,
    timeout: Option<Duration>,
    options: GenerationOptions,
}

impl<S: VideoService> JobOrchestratorBuilder<S> {
    /// Creates a builder with default settings.
    pub fn new(service: S) -> Self {
        Self {
            service,
            poll_interval: Duration::from_secs(10),
            progress_interval: Duration::from_secs(5),
            timeout: None,
            options: GenerationOptions::default(),
        }
    }

    /// Sets the wait between status polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the period of the rotating progress messages. Zero disables them.
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Bounds the time from submission until the job reports done,
    /// including a poll in flight. Unbounded by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the generation options.
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> JobOrchestrator<S> {
        JobOrchestrator {
            service: self.service,
            poll_interval: self.poll_interval,
            progress_interval: self.progress_interval,
            timeout: self.timeout,
            options: self.options,
        }
    }
}

/// Drives one generation from submission to downloaded bytes.
pub struct JobOrchestrator<S> {
    service: S,
    poll_interval: Duration,
    progress_interval: Duration,
    timeout: Option<Duration>,
    options: GenerationOptions,
}

impl<S: VideoService> JobOrchestrator<S> {
    /// Creates a new `JobOrchestratorBuilder`.
    pub fn builder(service: S) -> JobOrchestratorBuilder<S> {
        JobOrchestratorBuilder::new(service)
    }

    /// Returns the underlying service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Generates a video from `image` and `prompt`.
    ///
    /// Inputs are validated before any request is made. Progress messages
    /// go to `on_progress`; none are emitted after this returns, whatever
    /// the outcome. Nothing is retried: a single failed poll or download
    /// ends the generation.
    pub async fn submit_and_await<F>(
        &self,
        prompt: &str,
        image: ImagePayload,
        credential: &Credential,
        on_progress: F,
    ) -> Result<GeneratedVideo>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        validate_inputs(prompt, &image, credential)?;
        let on_progress: Arc<ProgressFn> = Arc::new(on_progress);
        let start = Instant::now();

        on_progress(MSG_INITIATING);
        let request = JobRequest::new(prompt, image).with_options(self.options.clone());
        let job = self.service.create_job(request, credential).await?;
        tracing::info!(job = %job.name, model = self.service.model(), "submitted video generation job");

        let ticker = ProgressTicker::start(self.progress_interval, Arc::clone(&on_progress));
        on_progress(MSG_PROCESSING);
        let polled = match self.timeout {
            Some(limit) => {
                let remaining = limit.saturating_sub(start.elapsed());
                tokio::time::timeout(remaining, self.poll_until_done(job, credential, start))
                    .await
                    .unwrap_or_else(|_| {
                        tracing::error!(
                            timeout_secs = limit.as_secs(),
                            "video generation timed out"
                        );
                        Err(MotionError::Timeout(limit))
                    })
            }
            None => self.poll_until_done(job, credential, start).await,
        };
        ticker.stop().await;
        let (job, polls) = polled?;

        let job_name = job.name.clone();
        let video_uri = job.into_video_uri().inspect_err(|e| {
            tracing::error!(job = %job_name, "generation finished without a video: {e}");
        })?;
        tracing::info!(job = %job_name, polls, "video generation complete");

        on_progress(MSG_DOWNLOADING);
        let url = authorized_download_url(&video_uri, credential)?;
        let data = self.service.download(&url).await?;

        Ok(GeneratedVideo::new(
            data,
            "video/mp4",
            VideoMetadata {
                model: Some(self.service.model().to_string()),
                duration_ms: Some(start.elapsed().as_millis() as u64),
                resolution: Some(self.options.resolution.clone()),
                aspect_ratio: Some(self.options.aspect_ratio.clone()),
                polls,
            },
        ))
    }

    /// Polls until the job reports done, returning the final snapshot and
    /// the number of polls made.
    async fn poll_until_done(
        &self,
        mut job: GenerationJob,
        credential: &Credential,
        start: Instant,
    ) -> Result<(GenerationJob, u32)> {
        let mut polls = 0;
        while !job.done {
            tokio::time::sleep(self.poll_interval).await;

            job = self
                .service
                .poll_job(&job, credential)
                .await
                .map_err(|e| {
                    tracing::error!(job = %job.name, "error during polling: {e}");
                    MotionError::PollFailed(Box::new(e))
                })?;
            polls += 1;

            tracing::debug!(
                job = %job.name,
                polls,
                done = job.done,
                elapsed_secs = start.elapsed().as_secs(),
                "polled video generation job"
            );
        }
        Ok((job, polls))
    }
}

/// Appends the credential to a result URI as the `key` query parameter.
///
/// Existing query parameters are kept. Only http(s) URIs can be downloaded.
pub fn authorized_download_url(uri: &str, credential: &Credential) -> Result<Url> {
    let mut url = Url::parse(uri)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(MotionError::VideoGeneration(format!(
            "result URI has unsupported scheme {:?} and cannot be downloaded directly",
            url.scheme()
        )));
    }
    url.query_pairs_mut().append_pair("key", credential.expose());
    Ok(url)
}

fn validate_inputs(prompt: &str, image: &ImagePayload, credential: &Credential) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(MotionError::InvalidRequest("prompt must not be empty".into()));
    }
    image.validate()?;
    if credential.expose().is_empty() {
        return Err(MotionError::MissingCredential);
    }
    Ok(())
}
