//! The end-to-end generation flow around a stored API key.

use crate::asset::AssetCollector;
use crate::credential::{Credential, CredentialStore};
use crate::error::{MotionError, Result};
use crate::video::{GeneratedVideo, JobOrchestrator, VideoService};

const MSG_PREPARING: &str = "Preparing your vision...";

/// Ties the credential store to an orchestrator.
///
/// Mirrors what a front end does around a generation: check the inputs,
/// check for a key, run the job, and forget the key if the service
/// rejected it so the user is asked for a new one.
pub struct Session<S> {
    store: CredentialStore,
    credential: Option<Credential>,
    orchestrator: JobOrchestrator<S>,
}

impl<S: VideoService> Session<S> {
    /// Opens a session, loading any stored key (or `GOOGLE_API_KEY`).
    pub fn open(store: CredentialStore, orchestrator: JobOrchestrator<S>) -> Result<Self> {
        let credential = store.resolve()?;
        Ok(Self {
            store,
            credential,
            orchestrator,
        })
    }

    /// Returns the active key, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// True when a key is available; a front end asks for one otherwise.
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Stores a new key and makes it active.
    pub fn set_credential(&mut self, credential: Credential) -> Result<()> {
        self.store.save(&credential)?;
        self.credential = Some(credential);
        Ok(())
    }

    /// Forgets the key, both in memory and on disk.
    pub fn clear_credential(&mut self) -> Result<()> {
        self.credential = None;
        self.store.clear()?;
        Ok(())
    }

    /// Returns the orchestrator.
    pub fn orchestrator(&self) -> &JobOrchestrator<S> {
        &self.orchestrator
    }

    /// Generates a video from the collector's image and prompt.
    ///
    /// Input problems are reported before anything is sent and leave the
    /// collector untouched. If the service rejects the key, the stored key
    /// is cleared before the error is returned.
    pub async fn generate<F>(
        &mut self,
        collector: &mut AssetCollector,
        on_progress: F,
    ) -> Result<GeneratedVideo>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        collector.check_ready()?;
        let credential = self
            .credential
            .clone()
            .ok_or(MotionError::MissingCredential)?;
        let submission = collector.take_submission()?;

        on_progress(MSG_PREPARING);
        let result = self
            .orchestrator
            .submit_and_await(&submission.prompt, submission.image, &credential, on_progress)
            .await;

        if let Err(err) = &result {
            if err.is_auth_failure() {
                tracing::warn!("API key rejected, clearing stored key: {err}");
                if let Err(clear_err) = self.clear_credential() {
                    tracing::error!("failed to clear stored API key: {clear_err}");
                }
            }
        }
        result
    }
}
