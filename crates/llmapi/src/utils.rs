use anyhow::{Context, Result};
use base64::Engine as _;
use std::path::Path;

/// Guesses a mime type from the file extension, falling back when there is none.
pub fn detect_mime_type<P: AsRef<Path>>(path: P, fallback: &str) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(fallback)
        .to_string()
}

pub fn encode_byte_to_base64(bytes: impl AsRef<[u8]>) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .context("Base64 decoding failed")
}

pub fn current_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default()
}
