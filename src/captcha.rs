//! Captcha image handling
//!
//! The captcha endpoint returns its image as base64, sometimes wrapped in a
//! `data:image/png;base64,` URI. The image is decoded and written to disk so a
//! human can read the code.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("data URI has no ',' separating the payload")]
    MalformedDataUri,

    #[error("invalid base64 image: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("failed to write captcha image: {0}")]
    Write(#[from] std::io::Error),
}

/// What was written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub bytes: usize,
    /// Detected format (e.g. `Png`) when the bytes are a recognised image
    pub format: Option<String>,
    pub dimensions: Option<(u32, u32)>,
}

/// Drop a leading `data:...,` marker, leaving only the base64 payload
pub fn strip_data_uri(encoded: &str) -> Result<&str, CaptchaError> {
    let encoded = encoded.trim();
    if !encoded.starts_with("data:") {
        return Ok(encoded);
    }
    encoded
        .split_once(',')
        .map(|(_, payload)| payload)
        .ok_or(CaptchaError::MalformedDataUri)
}

pub fn decode_image(encoded: &str) -> Result<Vec<u8>, CaptchaError> {
    let payload = strip_data_uri(encoded)?;
    Ok(STANDARD.decode(payload)?)
}

/// Decode and write the captcha to `path`
pub async fn save_image(encoded: &str, path: &Path) -> Result<SavedImage, CaptchaError> {
    let bytes = decode_image(encoded)?;
    tokio::fs::write(path, &bytes).await?;

    let (format, dimensions) = inspect(&bytes);
    Ok(SavedImage {
        bytes: bytes.len(),
        format,
        dimensions,
    })
}

fn inspect(bytes: &[u8]) -> (Option<String>, Option<(u32, u32)>) {
    let Ok(reader) = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format() else {
        return (None, None);
    };
    let format = reader.format().map(|f| format!("{f:?}"));
    let dimensions = reader.into_dimensions().ok();
    (format, dimensions)
}
