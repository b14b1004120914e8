//! Core types for video generation jobs.

use crate::asset::ImagePayload;
use crate::error::{MotionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options sent with every generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Number of videos to generate.
    pub number_of_videos: u32,
    /// Output resolution (e.g., "720p").
    pub resolution: String,
    /// Output aspect ratio (e.g., "16:9").
    pub aspect_ratio: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            number_of_videos: 1,
            resolution: "720p".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }
}

/// A request to create a generation job.
///
/// Owns the image payload; it is dropped once the request has been sent.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// The text prompt describing the desired motion.
    pub prompt: String,
    /// The source image.
    pub image: ImagePayload,
    /// Generation options.
    pub options: GenerationOptions,
}

impl JobRequest {
    /// Creates a request with the default options.
    pub fn new(prompt: impl Into<String>, image: ImagePayload) -> Self {
        Self {
            prompt: prompt.into(),
            image,
            options: GenerationOptions::default(),
        }
    }

    /// Replaces the generation options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Latest known state of a generation job.
///
/// Each poll returns a fresh snapshot which replaces the previous one; the
/// name may differ between snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationJob {
    /// Operation name used to poll the job.
    pub name: String,
    /// Whether the job has finished.
    pub done: bool,
    /// Download URI of the first generated video, once done.
    pub video_uri: Option<String>,
    /// Error reported by the service, if the job failed.
    pub error: Option<String>,
    /// Number of outputs removed by safety filters.
    pub filtered_count: u32,
}

impl GenerationJob {
    /// Creates a snapshot of a job that has not finished.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a snapshot of a finished job with the given result.
    pub fn completed(name: impl Into<String>, video_uri: Option<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            video_uri,
            ..Self::default()
        }
    }

    /// Returns the result URI of a finished job.
    ///
    /// A finished job without a non-empty URI is a failure: the service's
    /// error if it gave one, `ContentBlocked` if outputs were filtered, and
    /// `EmptyResult` otherwise.
    pub fn into_video_uri(self) -> Result<String> {
        if let Some(message) = self.error {
            return Err(MotionError::VideoGeneration(message));
        }
        match self.video_uri {
            Some(uri) if !uri.trim().is_empty() => Ok(uri),
            _ if self.filtered_count > 0 => Err(MotionError::ContentBlocked(
                "video was filtered by Veo safety filters".into(),
            )),
            _ => Err(MotionError::EmptyResult),
        }
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Wall-clock time from submission to download, in milliseconds.
    pub duration_ms: Option<u64>,
    /// Video resolution.
    pub resolution: Option<String>,
    /// Video aspect ratio.
    pub aspect_ratio: Option<String>,
    /// Number of status polls made.
    pub polls: u32,
}

/// A generated video with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated video should be saved or processed"]
pub struct GeneratedVideo {
    /// Raw video bytes.
    pub data: Vec<u8>,
    /// MIME type (e.g., "video/mp4").
    pub mime_type: String,
    /// Generation metadata.
    pub metadata: VideoMetadata,
}

impl GeneratedVideo {
    /// Creates a new generated video.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, metadata: VideoMetadata) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            metadata,
        }
    }

    /// Returns the size of the video data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the video to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the video data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the video as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}
