//! Image payloads sent to vision models

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::{Result, WardrobeError};

/// Media types every supported provider accepts
pub const SUPPORTED_MEDIA_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Upper bound on decoded image size
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// A validated, base64-encoded image with its content hash
#[derive(Debug, Clone, Serialize)]
pub struct ImageInput {
    /// Base64 payload, no data-URL prefix
    #[serde(skip)]
    data: String,
    media_type: String,
    /// Hex SHA-256 of the decoded bytes
    image_hash: String,
    byte_len: usize,
}

impl ImageInput {
    /// Validate a base64 payload
    ///
    /// Accepts bare base64 or a `data:image/...;base64,` URL. When
    /// `media_type` is absent it comes from the data URL or the magic bytes.
    pub fn from_base64(data: &str, media_type: Option<&str>) -> Result<Self> {
        let data = data.trim();
        if data.is_empty() {
            return Err(WardrobeError::Validation("image payload is empty".to_string()));
        }

        let (url_media_type, payload) = split_data_url(data);
        let bytes = STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| WardrobeError::Validation(format!("image is not valid base64: {}", e)))?;

        let media_type = media_type
            .map(str::to_string)
            .or(url_media_type)
            .or_else(|| sniff_media_type(&bytes).map(str::to_string));

        Self::build(payload.to_string(), bytes, media_type)
    }

    /// Wrap raw bytes, sniffing the media type when not given
    pub fn from_bytes(bytes: &[u8], media_type: Option<&str>) -> Result<Self> {
        let media_type = media_type
            .map(str::to_string)
            .or_else(|| sniff_media_type(bytes).map(str::to_string));
        Self::build(STANDARD.encode(bytes), bytes.to_vec(), media_type)
    }

    /// Read an image file
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(media_type_for_extension);
        Self::from_bytes(&bytes, by_extension)
    }

    fn build(data: String, bytes: Vec<u8>, media_type: Option<String>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(WardrobeError::Validation("image payload is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(WardrobeError::Validation(format!(
                "image is {} bytes, limit is {}",
                bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }

        let media_type = media_type
            .map(|m| normalize_media_type(&m))
            .ok_or_else(|| WardrobeError::Validation("could not determine image media type".to_string()))?;
        if !SUPPORTED_MEDIA_TYPES.contains(&media_type.as_str()) {
            return Err(WardrobeError::Validation(format!(
                "unsupported media type {}",
                media_type
            )));
        }

        let image_hash = sha256_hex(&bytes);
        Ok(Self {
            data,
            media_type,
            image_hash,
            byte_len: bytes.len(),
        })
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Content hash used for duplicate-upload detection
    pub fn image_hash(&self) -> &str {
        &self.image_hash
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

fn split_data_url(data: &str) -> (Option<String>, &str) {
    if let Some(rest) = data.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            let media_type = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            return (media_type, payload);
        }
    }
    (None, data)
}

fn normalize_media_type(media_type: &str) -> String {
    match media_type.trim().to_lowercase().as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        other => other.to_string(),
    }
}

fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Identify an image format from its magic bytes
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Lowercase hex SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
