//! Error types for video generation.

use std::time::Duration;

/// Provider error texts that mean the API key was rejected.
///
/// Only consulted when the error carries no structured status.
const AUTH_FAILURE_MARKERS: &[&str] = &[
    "API key not valid",
    "API_KEY_INVALID",
    "Request had invalid authentication credentials",
];

/// Errors that can occur while collecting assets or generating a video.
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    /// API key rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// No API key stored or provided.
    #[error("no API key provided")]
    MissingCredential,

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Polling exceeded the configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid user input (missing image, blank prompt, non-image file).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Malformed result URI.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (reading the image, saving the video).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A status poll failed; polling was abandoned.
    #[error("failed to get video generation status: {0}")]
    PollFailed(#[source] Box<MotionError>),

    /// The job finished without a result reference.
    #[error("video generation completed, but the result was empty")]
    EmptyResult,

    /// Downloading the finished video returned a non-success status.
    #[error("failed to download the generated video: status {status} {status_text}")]
    Download { status: u16, status_text: String },

    /// The job finished with an error reported by the service.
    #[error("video generation failed: {0}")]
    VideoGeneration(String),
}

impl MotionError {
    /// Returns true if the service rejected the API key.
    ///
    /// Structured variants are checked first. Message matching is the
    /// fallback for errors the service only describes in text.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Auth(_) => true,
            Self::Api { status, message } => {
                matches!(status, 401 | 403) || contains_auth_marker(message)
            }
            Self::PollFailed(inner) => inner.is_auth_failure(),
            Self::VideoGeneration(message) => contains_auth_marker(message),
            _ => false,
        }
    }

    /// Returns true if the error was raised before any network activity.
    pub fn is_user_input(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::MissingCredential)
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::PollFailed(inner) => inner.retry_after(),
            _ => None,
        }
    }
}

fn contains_auth_marker(text: &str) -> bool {
    AUTH_FAILURE_MARKERS.iter().any(|m| text.contains(m))
}

/// Maps an error to the single line shown to the user.
pub fn user_message(err: &MotionError) -> String {
    if err.is_auth_failure() {
        return "Your API key is invalid. Please enter a valid key.".to_string();
    }
    match err {
        MotionError::MissingCredential => "Please provide an API Key first.".to_string(),
        MotionError::InvalidRequest(msg) => msg.clone(),
        other => {
            let text = other.to_string();
            if text.is_empty() {
                "An unexpected error occurred during video generation.".to_string()
            } else {
                text
            }
        }
    }
}

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Pulls `error.message` out of a Google API error body, else returns the
/// trimmed body. Long bodies are truncated.
pub(crate) fn sanitize_error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(serde::Deserialize)]
    struct Detail {
        message: String,
    }

    let text = match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    };
    const MAX_LEN: usize = 500;
    if text.chars().count() > MAX_LEN {
        let truncated: String = text.chars().take(MAX_LEN).collect();
        format!("{truncated}...")
    } else {
        text
    }
}

/// Result type alias for video generation operations.
pub type Result<T> = std::result::Result<T, MotionError>;
