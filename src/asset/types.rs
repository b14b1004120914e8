//! Core types for source images.

use crate::error::{MotionError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Image formats recognised when loading a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format (first frame is used by the service).
    Gif,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        None
    }
}

/// A source image ready to be sent to the service.
///
/// The bytes are held base64-encoded, exactly as they go on the wire.
/// Fields are private so a payload cannot change after construction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    mime_type: String,
    image_bytes: String,
}

impl ImagePayload {
    /// Encodes raw image bytes. The MIME type must be an `image/*` type.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        check_image_mime(&mime_type)?;
        if bytes.is_empty() {
            return Err(MotionError::InvalidRequest("image file is empty".into()));
        }
        Ok(Self {
            mime_type,
            image_bytes: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }

    /// Wraps data that is already base64-encoded, checking that it decodes.
    pub fn from_base64(image_bytes: impl Into<String>, mime_type: impl Into<String>) -> Result<Self> {
        let payload = Self {
            mime_type: mime_type.into(),
            image_bytes: image_bytes.into(),
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Returns the MIME type (e.g., "image/png").
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the base64-encoded image data.
    pub fn image_bytes(&self) -> &str {
        &self.image_bytes
    }

    /// Checks that the payload has an image MIME type and non-empty,
    /// decodable base64 data.
    pub fn validate(&self) -> Result<()> {
        check_image_mime(&self.mime_type)?;
        if self.image_bytes.is_empty() {
            return Err(MotionError::InvalidRequest("image data is empty".into()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(&self.image_bytes)
            .map_err(|e| MotionError::Decode(format!("image data is not valid base64: {e}")))?;
        Ok(())
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("image_bytes_len", &self.image_bytes.len())
            .finish()
    }
}

fn check_image_mime(mime_type: &str) -> Result<()> {
    if mime_type.starts_with("image/") {
        Ok(())
    } else {
        Err(MotionError::InvalidRequest(format!(
            "expected an image file, got {mime_type:?}"
        )))
    }
}
