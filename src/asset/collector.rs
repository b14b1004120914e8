//! Holds the user's image and prompt until they are submitted.

use crate::asset::types::{ImageFormat, ImagePayload};
use crate::error::{MotionError, Result};
use std::path::Path;

const MISSING_INPUT: &str = "Please upload an image and enter a prompt.";

/// A prompt and image that passed input validation.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The prompt exactly as entered.
    pub prompt: String,
    /// The encoded source image.
    pub image: ImagePayload,
}

/// Collects a source image and prompt.
///
/// The image is only exposed once it has been fully read and encoded;
/// [`AssetCollector::take_submission`] moves it out so nothing is retained
/// after the request is sent.
#[derive(Debug, Default)]
pub struct AssetCollector {
    image: Option<ImagePayload>,
    prompt: String,
}

impl AssetCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads an image file fully into memory and encodes it.
    ///
    /// The format comes from the file's magic bytes, falling back to its
    /// extension. Non-image files are rejected and leave the current image
    /// untouched.
    pub async fn load_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;

        let format = ImageFormat::from_magic_bytes(&bytes).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        });
        let Some(format) = format else {
            return Err(MotionError::InvalidRequest(format!(
                "{} is not a recognised image file",
                path.display()
            )));
        };

        self.image = Some(ImagePayload::from_bytes(&bytes, format.mime_type())?);
        tracing::debug!(
            path = %path.display(),
            mime_type = format.mime_type(),
            size_bytes = bytes.len(),
            "loaded source image"
        );
        Ok(())
    }

    /// Sets the image from bytes already in memory.
    pub fn set_image_bytes(&mut self, bytes: &[u8], mime_type: impl Into<String>) -> Result<()> {
        self.image = Some(ImagePayload::from_bytes(bytes, mime_type)?);
        Ok(())
    }

    /// Replaces the prompt.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Returns the current prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the loaded image, if any.
    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    /// Drops the loaded image.
    pub fn clear_image(&mut self) {
        self.image = None;
    }

    /// Drops both the image and the prompt.
    pub fn clear(&mut self) {
        self.image = None;
        self.prompt.clear();
    }

    /// True when an image is loaded and the prompt is not blank.
    pub fn is_ready(&self) -> bool {
        self.image.is_some() && !self.prompt.trim().is_empty()
    }

    /// Fails with the user-facing message when not [`ready`](Self::is_ready).
    pub fn check_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(MotionError::InvalidRequest(MISSING_INPUT.into()))
        }
    }

    /// Moves the image and a copy of the prompt out for submission.
    ///
    /// On failure nothing changes.
    pub fn take_submission(&mut self) -> Result<Submission> {
        self.check_ready()?;
        let image = self
            .image
            .take()
            .ok_or_else(|| MotionError::InvalidRequest(MISSING_INPUT.into()))?;
        Ok(Submission {
            prompt: self.prompt.clone(),
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_blank_prompt_is_rejected() {
        let mut collector = AssetCollector::new();
        collector.set_image_bytes(&PNG_BYTES, "image/png").unwrap();
        collector.set_prompt("   \n\t");

        assert!(!collector.is_ready());
        let err = collector.take_submission().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid request: Please upload an image and enter a prompt."
        );
        // Failed submission keeps the image
        assert!(collector.image().is_some());
    }

    #[test]
    fn test_missing_image_is_rejected() {
        let mut collector = AssetCollector::new();
        collector.set_prompt("A cat dancing");
        assert!(matches!(
            collector.take_submission(),
            Err(MotionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_take_submission_moves_image_and_keeps_prompt_verbatim() {
        let mut collector = AssetCollector::new();
        collector.set_image_bytes(&PNG_BYTES, "image/png").unwrap();
        collector.set_prompt("  waves crashing  ");

        let submission = collector.take_submission().unwrap();
        assert_eq!(submission.prompt, "  waves crashing  ");
        assert_eq!(submission.image.mime_type(), "image/png");
        assert!(collector.image().is_none());
        assert_eq!(collector.prompt(), "  waves crashing  ");
    }

    #[test]
    fn test_clear() {
        let mut collector = AssetCollector::new();
        collector.set_image_bytes(&PNG_BYTES, "image/png").unwrap();
        collector.set_prompt("x");
        collector.clear();
        assert!(collector.image().is_none());
        assert!(collector.prompt().is_empty());
    }

    #[tokio::test]
    async fn test_load_image_detects_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        // Wrong extension on purpose: magic bytes win
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, PNG_BYTES).unwrap();

        let mut collector = AssetCollector::new();
        collector.load_image(&path).await.unwrap();
        assert_eq!(collector.image().unwrap().mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_load_image_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.webp");
        std::fs::write(&path, [1, 2, 3]).unwrap();

        let mut collector = AssetCollector::new();
        collector.load_image(&path).await.unwrap();
        assert_eq!(collector.image().unwrap().mime_type(), "image/webp");
    }

    #[tokio::test]
    async fn test_load_image_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "just some text here").unwrap();

        let mut collector = AssetCollector::new();
        let err = collector.load_image(&path).await.unwrap_err();
        assert!(matches!(err, MotionError::InvalidRequest(_)));
        assert!(collector.image().is_none());
    }

    #[tokio::test]
    async fn test_load_image_missing_file() {
        let mut collector = AssetCollector::new();
        let err = collector
            .load_image("/definitely/not/here.png")
            .await
            .unwrap_err();
        assert!(matches!(err, MotionError::Io(_)));
    }
}
