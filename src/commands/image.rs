use std::path::Path;

use crate::commands::AppState;
use crate::intake::{stage_image_file, stage_image_payload};
use crate::models::{ImageReference, StageImagePayload};

pub async fn stage_image(
    state: &AppState,
    payload: StageImagePayload,
) -> Result<ImageReference, String> {
    let image = stage_image_payload(payload).map_err(|err| err.user_message())?;
    state.session.lock().await.stage_image(image.clone());
    Ok(image)
}

pub async fn stage_image_from_path(
    state: &AppState,
    path: &str,
    mime_type: Option<String>,
) -> Result<ImageReference, String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("Image path cannot be empty.".into());
    }

    let image = stage_image_file(Path::new(trimmed), mime_type)
        .await
        .map_err(|err| err.user_message())?;
    state.session.lock().await.stage_image(image.clone());
    Ok(image)
}

/// Clears the staged image and any result or error.
pub async fn reset(state: &AppState) {
    state.session.lock().await.reset();
}
