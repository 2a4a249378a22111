//! Image intake: turns raw uploads into [`ImageReference`] records.

use std::path::Path;

use llmapi::utils::{decode_base64, encode_byte_to_base64};
use tokio::fs;

use crate::error::{GenerationError, Result};
use crate::fs_utils::resolve_mime_type;
use crate::models::{ImageReference, StageImagePayload};

/// Reads an image file and stages it. The mime type is guessed from the extension
/// when not supplied.
pub async fn stage_image_file(path: &Path, mime_type: Option<String>) -> Result<ImageReference> {
    let bytes = fs::read(path).await.map_err(|err| {
        GenerationError::ImageDecode(format!("unable to read '{}': {}", path.display(), err))
    })?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);
    let mime_type = resolve_mime_type(mime_type, path);

    tracing::debug!(path = %path.display(), %mime_type, size = bytes.len(), "staged image file");
    Ok(stage_image_bytes(&bytes, mime_type, file_name))
}

pub fn stage_image_bytes(
    bytes: &[u8],
    mime_type: String,
    file_name: Option<String>,
) -> ImageReference {
    ImageReference::new(file_name, mime_type, encode_byte_to_base64(bytes))
}

/// Stages an image sent by the view layer, either as a data URI or as bare base64.
///
/// The payload is decoded and re-encoded so the staged record always carries canonical
/// base64 derived from real bytes.
pub fn stage_image_payload(payload: StageImagePayload) -> Result<ImageReference> {
    let StageImagePayload {
        file_name,
        mime_type,
        data_base64,
    } = payload;

    let (uri_mime, body) = match split_data_uri(&data_base64) {
        Some((mime, body)) => (Some(mime.to_string()), body),
        None => (None, data_base64.trim()),
    };

    let bytes = decode_body(body)?;

    let name_hint = file_name.clone().unwrap_or_default();
    let mime_type = resolve_mime_type(mime_type.or(uri_mime), Path::new(&name_hint));

    Ok(stage_image_bytes(&bytes, mime_type, file_name))
}

/// Splits `data:<mime>;base64,<body>` into its mime type and body.
pub fn split_data_uri(value: &str) -> Option<(&str, &str)> {
    let rest = value.trim().strip_prefix("data:")?;
    let (header, body) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, body))
}

/// Decodes the bytes behind a base64 data URI.
pub fn decode_data_uri(value: &str) -> Result<Vec<u8>> {
    let (_, body) = split_data_uri(value)
        .ok_or_else(|| GenerationError::ImageDecode("not a base64 data URI".to_string()))?;
    decode_body(body)
}

fn decode_body(body: &str) -> Result<Vec<u8>> {
    decode_base64(body)
        .map_err(|err| GenerationError::ImageDecode(format!("invalid base64 payload: {err:#}")))
}
