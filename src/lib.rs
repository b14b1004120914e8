#![warn(missing_docs)]
//! motionframe - animate a still image into a short video with Veo.
//!
//! Give it a source image and a prompt; it submits a Veo generation job
//! through the Gemini Developer API, polls until the job finishes, and
//! downloads the resulting video.
//!
//! # Quick Start
//!
//! ```no_run
//! use motionframe::{AssetCollector, Credential, JobOrchestrator, VeoService};
//!
//! #[tokio::main]
//! async fn main() -> motionframe::Result<()> {
//!     let mut assets = AssetCollector::new();
//!     assets.load_image("portrait.png").await?;
//!     assets.set_prompt("The person smiles and waves at the camera");
//!     let submission = assets.take_submission()?;
//!
//!     let orchestrator = JobOrchestrator::builder(VeoService::builder().build()?).build();
//!     let credential = Credential::new(std::env::var("GOOGLE_API_KEY").unwrap_or_default())?;
//!     let video = orchestrator
//!         .submit_and_await(&submission.prompt, submission.image, &credential, |msg: &str| {
//!             eprintln!("{msg}")
//!         })
//!         .await?;
//!     video.save("waving.mp4")?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `motionframe` command-line tool

pub mod asset;
pub mod credential;
mod error;
pub mod session;
pub mod video;

// Re-export error types at crate root
pub use error::{user_message, MotionError, Result};

pub use asset::{AssetCollector, ImageFormat, ImagePayload, Submission};
pub use credential::{Credential, CredentialStore};
pub use session::Session;
pub use video::providers::{VeoModel, VeoService, VeoServiceBuilder};
pub use video::{
    GeneratedVideo, GenerationJob, GenerationOptions, JobOrchestrator, JobOrchestratorBuilder,
    JobRequest, VideoMetadata, VideoService,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::asset::{AssetCollector, ImagePayload};
    pub use crate::credential::{Credential, CredentialStore};
    pub use crate::error::{MotionError, Result};
    pub use crate::session::Session;
    pub use crate::video::providers::VeoService;
    pub use crate::video::{GeneratedVideo, JobOrchestrator, VideoService};
}
