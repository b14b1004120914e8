//! Video service trait.

use crate::credential::Credential;
use crate::error::Result;
use crate::video::types::{GenerationJob, JobRequest};
use async_trait::async_trait;
use url::Url;

/// The external video generation service.
///
/// The credential is passed on every call rather than held by the
/// implementation, so one service can serve any key.
#[async_trait]
pub trait VideoService: Send + Sync {
    /// Creates a generation job and returns its first snapshot.
    async fn create_job(&self, request: JobRequest, credential: &Credential)
        -> Result<GenerationJob>;

    /// Fetches the current snapshot of a job.
    async fn poll_job(&self, job: &GenerationJob, credential: &Credential)
        -> Result<GenerationJob>;

    /// Downloads a finished video.
    ///
    /// `url` already carries whatever authorization the download needs.
    /// A non-success status must map to `MotionError::Download`.
    async fn download(&self, url: &Url) -> Result<Vec<u8>>;

    /// Returns the model identifier used for generation.
    fn model(&self) -> &str;

    /// Checks that the service is reachable and accepts the credential.
    async fn health_check(&self, credential: &Credential) -> Result<()>;
}
