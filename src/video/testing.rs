//! Scripted in-memory `VideoService` for tests.

use crate::credential::Credential;
use crate::error::{MotionError, Result};
use crate::video::service::VideoService;
use crate::video::types::{GenerationJob, JobRequest};
use async_trait::async_trait;
use std::sync::Mutex;
use url::Url;

/// What the service reports for one snapshot.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Pending,
    Done(Option<String>),
    Fail(String),
}

/// Answers `create_job` with the first step and each `poll_job` with the
/// next scripted step. The last step repeats once the script runs out.
pub(crate) struct ScriptedService {
    first: Step,
    polls: Vec<Step>,
    create_error: Mutex<Option<MotionError>>,
    download: Mutex<Option<Result<Vec<u8>>>>,
    polled: Mutex<Vec<String>>,
    downloaded: Mutex<Vec<String>>,
    last_request: Mutex<Option<JobRequest>>,
}

impl ScriptedService {
    pub(crate) fn new(first: Step) -> Self {
        Self {
            first,
            polls: Vec::new(),
            create_error: Mutex::new(None),
            download: Mutex::new(None),
            polled: Mutex::new(Vec::new()),
            downloaded: Mutex::new(Vec::new()),
            last_request: Mutex::new(None),
        }
    }

    pub(crate) fn then(mut self, step: Step) -> Self {
        self.polls.push(step);
        self
    }

    pub(crate) fn with_download(self, result: Result<Vec<u8>>) -> Self {
        *self.download.lock().unwrap() = Some(result);
        self
    }

    pub(crate) fn with_create_error(self, err: MotionError) -> Self {
        *self.create_error.lock().unwrap() = Some(err);
        self
    }

    pub(crate) fn poll_count(&self) -> usize {
        self.polled.lock().unwrap().len()
    }

    pub(crate) fn polled_names(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }

    pub(crate) fn downloaded_urls(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> Option<JobRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn snapshot(step: &Step, index: usize) -> Result<GenerationJob> {
        let name = format!("operations/{index}");
        match step {
            Step::Pending => Ok(GenerationJob::pending(name)),
            Step::Done(uri) => Ok(GenerationJob::completed(name, uri.clone())),
            Step::Fail(message) => Err(MotionError::Api {
                status: 503,
                message: message.clone(),
            }),
        }
    }
}

#[async_trait]
impl VideoService for ScriptedService {
    async fn create_job(
        &self,
        request: JobRequest,
        _credential: &Credential,
    ) -> Result<GenerationJob> {
        *self.last_request.lock().unwrap() = Some(request);
        if let Some(err) = self.create_error.lock().unwrap().take() {
            return Err(err);
        }
        Self::snapshot(&self.first, 0)
    }

    async fn poll_job(
        &self,
        job: &GenerationJob,
        _credential: &Credential,
    ) -> Result<GenerationJob> {
        let index = {
            let mut polled = self.polled.lock().unwrap();
            polled.push(job.name.clone());
            polled.len()
        };
        let step = self
            .polls
            .get(index - 1)
            .or(self.polls.last())
            .unwrap_or(&self.first);
        Self::snapshot(step, index)
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        self.downloaded.lock().unwrap().push(url.to_string());
        self.download
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn health_check(&self, _credential: &Credential) -> Result<()> {
        Ok(())
    }
}
