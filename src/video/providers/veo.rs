//! Veo (Google) video generation through the Gemini Developer API.

use crate::credential::Credential;
use crate::error::{parse_retry_after, sanitize_error_message, MotionError, Result};
use crate::video::service::VideoService;
use crate::video::types::{GenerationJob, JobRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default Gemini Developer API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Veo model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VeoModel {
    /// Veo 3.1 Fast Preview - lower latency.
    #[default]
    Veo31FastPreview,
    /// Veo 3.1 Preview - full quality.
    Veo31Preview,
}

impl VeoModel {
    /// Returns the Gemini Developer API model identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veo31FastPreview => "veo-3.1-fast-generate-preview",
            Self::Veo31Preview => "veo-3.1-generate-preview",
        }
    }
}

impl std::str::FromStr for VeoModel {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fast" | "veo-3.1-fast-generate-preview" => Ok(Self::Veo31FastPreview),
            "standard" | "veo-3.1-generate-preview" => Ok(Self::Veo31Preview),
            other => Err(MotionError::InvalidRequest(format!(
                "unknown Veo model: {other}"
            ))),
        }
    }
}

/// Builder for VeoService.
#[derive(Debug, Clone)]
pub struct VeoServiceBuilder {
    model: VeoModel,
    base_url: String,
    request_timeout: Duration,
}

impl Default for VeoServiceBuilder {
    fn default() -> Self {
        Self {
            model: VeoModel::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl VeoServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Veo model variant.
    pub fn model(mut self, model: VeoModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API root (e.g., for a proxy).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the per-request HTTP timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the service.
    pub fn build(self) -> Result<VeoService> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?;
        Ok(VeoService {
            client,
            model: self.model,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Veo video generation service.
pub struct VeoService {
    client: reqwest::Client,
    model: VeoModel,
    base_url: String,
}

impl VeoService {
    /// Creates a new `VeoServiceBuilder`.
    pub fn builder() -> VeoServiceBuilder {
        VeoServiceBuilder::new()
    }

    fn create_url(&self) -> String {
        format!(
            "{}/models/{}:predictLongRunning",
            self.base_url,
            self.model.as_str()
        )
    }

    fn operation_url(&self, operation_name: &str) -> String {
        format!("{}/{}", self.base_url, operation_name.trim_start_matches('/'))
    }

    async fn read_operation(response: reqwest::Response) -> Result<GenerationJob> {
        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }
        let operation: VeoOperationResponse = response.json().await?;
        Ok(operation.into())
    }
}

#[async_trait]
impl VideoService for VeoService {
    async fn create_job(
        &self,
        request: JobRequest,
        credential: &Credential,
    ) -> Result<GenerationJob> {
        let body = VeoRequest::from_request(&request);
        drop(request);

        let response = self
            .client
            .post(self.create_url())
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await?;

        Self::read_operation(response).await
    }

    async fn poll_job(
        &self,
        job: &GenerationJob,
        credential: &Credential,
    ) -> Result<GenerationJob> {
        let response = self
            .client
            .get(self.operation_url(&job.name))
            .header("x-goog-api-key", credential.expose())
            .send()
            .await?;

        Self::read_operation(response).await
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        // reqwest errors embed the URL, which carries the API key
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| MotionError::Network(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MotionError::Network(e.without_url()))?;
        tracing::debug!(size_bytes = bytes.len(), "downloaded video");
        Ok(bytes.to_vec())
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }

    async fn health_check(&self, credential: &Credential) -> Result<()> {
        let url = format!("{}/models/{}", self.base_url, self.model.as_str());
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", credential.expose())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        Err(parse_error(status.as_u16(), &text, &headers))
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> MotionError {
    if status == 404 {
        return MotionError::InvalidRequest(
            "Veo API not available. Veo requires a paid-tier API key with billing enabled. \
             See https://ai.google.dev/gemini-api/docs/billing"
                .to_string(),
        );
    }
    let rejected_key = is_key_rejection(text);
    let text = sanitize_error_message(text);
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(Duration::from_secs);
        return MotionError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 || rejected_key {
        return MotionError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return MotionError::ContentBlocked(text);
    }
    MotionError::Api {
        status,
        message: text,
    }
}

fn download_error(status: reqwest::StatusCode) -> MotionError {
    MotionError::Download {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<GoogleErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

/// Google reports a bad or expired key as a 400 whose `error.details`
/// carry the `API_KEY_INVALID` reason.
fn is_key_rejection(body: &str) -> bool {
    let Ok(body) = serde_json::from_str::<GoogleErrorBody>(body) else {
        return false;
    };
    body.error.status.as_deref() == Some("UNAUTHENTICATED")
        || body
            .error
            .details
            .iter()
            .any(|detail| detail.reason.as_deref() == Some("API_KEY_INVALID"))
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoInstance {
    prompt: String,
    image: VeoImage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    aspect_ratio: String,
    resolution: String,
    sample_count: u32,
}

impl VeoRequest {
    fn from_request(req: &JobRequest) -> Self {
        Self {
            instances: vec![VeoInstance {
                prompt: req.prompt.clone(),
                image: VeoImage {
                    bytes_base64_encoded: req.image.image_bytes().to_string(),
                    mime_type: req.image.mime_type().to_string(),
                },
            }],
            parameters: VeoParameters {
                aspect_ratio: req.options.aspect_ratio.clone(),
                resolution: req.options.resolution.clone(),
                sample_count: req.options.number_of_videos,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct VeoOperationResponse {
    name: String,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<VeoVideoResponse>,
    #[serde(default)]
    error: Option<VeoError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<VeoGeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    rai_media_filtered_reasons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct VeoGeneratedSample {
    #[serde(default)]
    video: Option<VeoVideo>,
}

#[derive(Debug, Deserialize)]
struct VeoVideo {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoError {
    #[serde(default)]
    message: Option<String>,
}

impl From<VeoOperationResponse> for GenerationJob {
    fn from(operation: VeoOperationResponse) -> Self {
        let error = operation
            .error
            .map(|e| e.message.unwrap_or_else(|| "Unknown error".into()));
        // An operation carrying an error is finished even if `done` is absent
        let done = operation.done.unwrap_or(false) || error.is_some();

        let generated = operation.response.and_then(|r| r.generate_video_response);
        let filtered_count = generated
            .as_ref()
            .and_then(|g| g.rai_media_filtered_count)
            .unwrap_or(0);
        if let Some(reasons) = generated
            .as_ref()
            .and_then(|g| g.rai_media_filtered_reasons.as_ref())
        {
            tracing::warn!(?reasons, "Veo filtered generated media");
        }
        let video_uri = generated
            .and_then(|g| g.generated_samples)
            .and_then(|samples| samples.into_iter().next())
            .and_then(|sample| sample.video)
            .and_then(|video| video.uri);

        GenerationJob {
            name: operation.name,
            done,
            video_uri,
            error,
            filtered_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ImagePayload;
    use crate::video::types::GenerationOptions;

    fn request() -> JobRequest {
        let image = ImagePayload::from_bytes(&[0x89, 0x50, 0x4E, 0x47], "image/png").unwrap();
        JobRequest::new("A person waving", image)
    }

    #[test]
    fn test_veo_model_as_str() {
        assert_eq!(
            VeoModel::Veo31FastPreview.as_str(),
            "veo-3.1-fast-generate-preview"
        );
        assert_eq!(VeoModel::Veo31Preview.as_str(), "veo-3.1-generate-preview");
        assert_eq!(VeoModel::default(), VeoModel::Veo31FastPreview);
    }

    #[test]
    fn test_veo_model_from_str() {
        assert_eq!("fast".parse::<VeoModel>().unwrap(), VeoModel::Veo31FastPreview);
        assert_eq!(
            "veo-3.1-generate-preview".parse::<VeoModel>().unwrap(),
            VeoModel::Veo31Preview
        );
        assert!("veo-2".parse::<VeoModel>().is_err());
    }

    #[test]
    fn test_urls() {
        let service = VeoService::builder()
            .base_url("https://proxy.example.com/v1beta/")
            .build()
            .unwrap();
        assert_eq!(
            service.create_url(),
            "https://proxy.example.com/v1beta/models/veo-3.1-fast-generate-preview:predictLongRunning"
        );
        assert_eq!(
            service.operation_url("models/veo/operations/abc"),
            "https://proxy.example.com/v1beta/models/veo/operations/abc"
        );
    }

    #[test]
    fn test_request_wire_format() {
        let veo_req = VeoRequest::from_request(&request());
        let json = serde_json::to_value(&veo_req).unwrap();

        let instance = &json["instances"][0];
        assert_eq!(instance["prompt"], "A person waving");
        assert_eq!(instance["image"]["mimeType"], "image/png");
        assert_eq!(instance["image"]["bytesBase64Encoded"], "iVBORw==");

        let params = &json["parameters"];
        assert_eq!(params["aspectRatio"], "16:9");
        assert_eq!(params["resolution"], "720p");
        assert_eq!(params["sampleCount"], 1);
    }

    #[test]
    fn test_request_uses_custom_options() {
        let req = request().with_options(GenerationOptions {
            number_of_videos: 2,
            resolution: "1080p".into(),
            aspect_ratio: "9:16".into(),
        });
        let json = serde_json::to_value(VeoRequest::from_request(&req)).unwrap();
        assert_eq!(json["parameters"]["sampleCount"], 2);
        assert_eq!(json["parameters"]["resolution"], "1080p");
        assert_eq!(json["parameters"]["aspectRatio"], "9:16");
    }

    #[test]
    fn test_operation_not_done() {
        let json = r#"{"name": "models/veo/operations/123"}"#;
        let resp: VeoOperationResponse = serde_json::from_str(json).unwrap();
        let job = GenerationJob::from(resp);
        assert_eq!(job, GenerationJob::pending("models/veo/operations/123"));
    }

    #[test]
    fn test_operation_done_with_video() {
        let json = r#"{
            "name": "models/veo/operations/123",
            "done": true,
            "response": {
                "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
                "generateVideoResponse": {
                    "generatedSamples": [
                        {"video": {"uri": "https://generativelanguage.googleapis.com/v1beta/files/abc:download?alt=media"}},
                        {"video": {"uri": "https://example.com/second.mp4"}}
                    ]
                }
            }
        }"#;
        let resp: VeoOperationResponse = serde_json::from_str(json).unwrap();
        let job = GenerationJob::from(resp);
        assert!(job.done);
        assert_eq!(
            job.video_uri.as_deref(),
            Some("https://generativelanguage.googleapis.com/v1beta/files/abc:download?alt=media")
        );
    }

    #[test]
    fn test_operation_done_without_samples_is_empty_result() {
        let json = r#"{"name": "operations/1", "done": true, "response": {"generateVideoResponse": {}}}"#;
        let resp: VeoOperationResponse = serde_json::from_str(json).unwrap();
        let job = GenerationJob::from(resp);
        assert!(matches!(job.into_video_uri(), Err(MotionError::EmptyResult)));
    }

    #[test]
    fn test_operation_filtered() {
        let json = r#"{
            "name": "operations/1",
            "done": true,
            "response": {"generateVideoResponse": {
                "raiMediaFilteredCount": 1,
                "raiMediaFilteredReasons": ["Prompt contained prohibited content."]
            }}
        }"#;
        let resp: VeoOperationResponse = serde_json::from_str(json).unwrap();
        let job = GenerationJob::from(resp);
        assert_eq!(job.filtered_count, 1);
        assert!(matches!(
            job.into_video_uri(),
            Err(MotionError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_operation_error_marks_done() {
        let json = r#"{"name": "operations/1", "error": {"code": 8, "message": "Quota exceeded"}}"#;
        let resp: VeoOperationResponse = serde_json::from_str(json).unwrap();
        let job = GenerationJob::from(resp);
        assert!(job.done);
        assert_eq!(job.error.as_deref(), Some("Quota exceeded"));
    }

    #[test]
    fn test_parse_error_auth() {
        let headers = reqwest::header::HeaderMap::new();
        let err = parse_error(
            403,
            r#"{"error": {"message": "Method doesn't allow unregistered callers."}}"#,
            &headers,
        );
        assert!(matches!(err, MotionError::Auth(_)));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_parse_error_invalid_key_is_auth_failure() {
        let headers = reqwest::header::HeaderMap::new();
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        let err = parse_error(400, body, &headers);
        assert!(matches!(err, MotionError::Api { status: 400, .. }));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_parse_error_expired_key_reason_is_auth() {
        let headers = reqwest::header::HeaderMap::new();
        let body = r#"{"error": {"code": 400, "message": "API key expired. Please renew the API key.", "status": "INVALID_ARGUMENT", "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID", "domain": "googleapis.com"}]}}"#;
        let err = parse_error(400, body, &headers);
        match &err {
            MotionError::Auth(msg) => assert_eq!(msg, "API key expired. Please renew the API key."),
            other => panic!("expected Auth, got {other:?}"),
        }
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_parse_error_unauthenticated_status_is_auth() {
        let headers = reqwest::header::HeaderMap::new();
        let body = r#"{"error": {"code": 400, "message": "Request is missing credentials.", "status": "UNAUTHENTICATED"}}"#;
        assert!(matches!(parse_error(400, body, &headers), MotionError::Auth(_)));
    }

    #[test]
    fn test_parse_error_other_reason_stays_api_error() {
        let headers = reqwest::header::HeaderMap::new();
        let body = r#"{"error": {"code": 400, "message": "Unsupported resolution.", "status": "INVALID_ARGUMENT", "details": [{"reason": "BAD_RESOLUTION"}]}}"#;
        let err = parse_error(400, body, &headers);
        assert!(matches!(err, MotionError::Api { status: 400, .. }));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_download_error_names_status() {
        match download_error(reqwest::StatusCode::FORBIDDEN) {
            MotionError::Download {
                status,
                status_text,
            } => {
                assert_eq!(status, 403);
                assert_eq!(status_text, "Forbidden");
            }
            other => panic!("expected Download, got {other:?}"),
        }

        let err = download_error(reqwest::StatusCode::from_u16(599).unwrap());
        assert_eq!(
            err.to_string(),
            "failed to download the generated video: status 599 Unknown"
        );
    }

    #[test]
    fn test_parse_error_rate_limited() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "42".parse().unwrap());
        let err = parse_error(429, "slow down", &headers);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
    }

    #[test]
    fn test_parse_error_404_gives_billing_hint() {
        let headers = reqwest::header::HeaderMap::new();
        match parse_error(404, "Not Found", &headers) {
            MotionError::InvalidRequest(msg) => assert!(msg.contains("billing")),
            other => panic!("Expected InvalidRequest error, got: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_safety() {
        let headers = reqwest::header::HeaderMap::new();
        let err = parse_error(400, "Request blocked by safety settings", &headers);
        assert!(matches!(err, MotionError::ContentBlocked(_)));
    }
}
