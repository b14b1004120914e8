//! Video generation: job types, the service seam and the orchestrator.

mod orchestrator;
mod progress;
pub mod providers;
mod service;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use orchestrator::{authorized_download_url, JobOrchestrator, JobOrchestratorBuilder};
pub use progress::{ProgressFn, PROGRESS_MESSAGES};
pub use service::VideoService;
pub use types::{
    GeneratedVideo, GenerationJob, GenerationOptions, JobRequest, VideoMetadata,
};
