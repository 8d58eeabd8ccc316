//! # Image Encoder
//!
//! Turns an [`ImageRef`] into a base64 data URI that fits in a JSON request
//! body.
//!
//! The file read goes through `tokio::fs` and the base64 pass runs on the
//! blocking pool, so the caller awaits the payload without stalling the event
//! loop. There is no retry; a failure here ends the current attempt.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use tracing::debug;

use crate::error::{SnapError, SnapResult};
use crate::source::ImageRef;

/// Fallback MIME type for content that is not a recognised image.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Self-describing text encoding of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    data_uri: String,
    mime: String,
    byte_len: usize,
}

impl EncodedPayload {
    /// Encode raw bytes of type `mime`.
    pub fn from_bytes(bytes: &[u8], mime: &str) -> Self {
        let data_uri = format!(
            "data:{};base64,{}",
            mime,
            general_purpose::STANDARD.encode(bytes)
        );
        Self {
            data_uri,
            mime: mime.to_string(),
            byte_len: bytes.len(),
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn as_str(&self) -> &str {
        &self.data_uri
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Size of the image before encoding.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

/// Detect an image MIME type from its magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    // PNG: 89 50 4E 47
    if bytes.starts_with(&[0x89, 0x50, 0x4e, 0x47]) {
        return Some("image/png");
    }
    // JPEG: FF D8 FF
    if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF8") {
        return Some("image/gif");
    }
    // WebP: RIFF ... WEBP
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}

/// Abstract interface for payload encoders.
#[async_trait]
pub trait PayloadEncoder: Send + Sync {
    /// Read the bytes behind `image` and encode them.
    ///
    /// # Errors
    ///
    /// `SnapError::Encoding` when the reference is unreadable, expired or
    /// empty.
    async fn encode(&self, image: &ImageRef) -> SnapResult<EncodedPayload>;
}

/// Production encoder producing base64 data URIs.
#[derive(Debug, Clone, Default)]
pub struct DataUriEncoder;

impl DataUriEncoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PayloadEncoder for DataUriEncoder {
    async fn encode(&self, image: &ImageRef) -> SnapResult<EncodedPayload> {
        let reference = image.to_string();
        let bytes: std::sync::Arc<[u8]> = match image {
            ImageRef::File(path) => tokio::fs::read(path)
                .await
                .map_err(|e| {
                    SnapError::encoding_from(reference.clone(), e)
                        .with_operation("read image")
                        .with_recovery_suggestion("Pick the photo again")
                })?
                .into(),
            ImageRef::Memory { bytes, .. } => bytes.clone(),
        };

        if bytes.is_empty() {
            return Err(SnapError::encoding(reference, "image is empty"));
        }

        let mime = image
            .known_mime()
            .or_else(|| sniff_mime(&bytes))
            .unwrap_or(OCTET_STREAM)
            .to_string();

        let payload = tokio::task::spawn_blocking(move || EncodedPayload::from_bytes(&bytes, &mime))
            .await
            .map_err(|e| SnapError::encoding(reference.clone(), format!("encoder task failed: {}", e)))?;

        debug!(
            image = %reference,
            mime = payload.mime(),
            bytes = payload.byte_len(),
            encoded = payload.as_str().len(),
            "image encoded"
        );
        Ok(payload)
    }
}
