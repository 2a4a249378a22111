use std::path::Path;

use llmapi::utils::current_timestamp_millis;
use serde::Serialize;
use tokio::fs;

use crate::commands::AppState;
use crate::error::{GenerationError, Result};
use crate::fs_utils::{download_filename, ensure_dir, ensure_unique_file_name};
use crate::intake::decode_data_uri;
use crate::models::{
    DownloadedImage, GenerateImagePayload, GenerateImageResponsePayload, GenerationResult,
    PromptRequest,
};
use crate::prompt::compose_prompt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFailure {
    pub message: String,
    /// Set when the key was rejected; the view should open the key settings.
    pub open_settings: bool,
}

impl From<&GenerationError> for GenerateFailure {
    fn from(err: &GenerationError) -> Self {
        Self {
            message: err.user_message(),
            open_settings: err.is_credential_invalid(),
        }
    }
}

pub async fn generate_image(
    state: &AppState,
    payload: GenerateImagePayload,
) -> std::result::Result<GenerateImageResponsePayload, GenerateFailure> {
    let prompt = compose_prompt(payload.mode, &payload.prompt, &payload.character);
    let use_pro = state.tier.snapshot().await.tier_enabled;

    let (ticket, request) = {
        let mut session = state.session.lock().await;
        let image = session.staged_image().cloned();
        match PromptRequest::new(&prompt, image, use_pro) {
            Ok(request) => (session.begin(), request),
            Err(err) => {
                let failure = GenerateFailure::from(&err);
                session.reject(failure.message.clone());
                return Err(failure);
            }
        }
    };

    let outcome = state.generator.generate(&request).await;

    if matches!(&outcome, Err(err) if err.is_credential_invalid()) {
        state.tier.mark_credential_invalid().await;
    }

    let mut session = state.session.lock().await;
    match outcome {
        Ok(result) => {
            session.complete(ticket, Ok(result.clone()));
            Ok(GenerateImageResponsePayload {
                result,
                used_pro_model: use_pro,
            })
        }
        Err(err) => {
            let failure = GenerateFailure::from(&err);
            session.complete(ticket, Err(failure.message.clone()));
            Err(failure)
        }
    }
}

/// Writes the current result's image into the configured download directory.
pub async fn download_result(state: &AppState) -> std::result::Result<DownloadedImage, String> {
    let result = state
        .session
        .lock()
        .await
        .result()
        .cloned()
        .ok_or_else(|| "There is no generated image to download.".to_string())?;

    save_download(&result, &state.config().download_dir, current_timestamp_millis())
        .await
        .map_err(|err| err.user_message())
}

pub async fn save_download(
    result: &GenerationResult,
    dir: &Path,
    epoch_millis: u64,
) -> Result<DownloadedImage> {
    let image_url = result.image_url().ok_or_else(|| {
        GenerationError::ImageDecode("the result contains no image".to_string())
    })?;
    let bytes = decode_data_uri(image_url)?;

    let dir = ensure_dir(dir).await?;
    let file_name = ensure_unique_file_name(&dir, &download_filename(epoch_millis)).await?;
    let target_path = dir.join(&file_name);
    fs::write(&target_path, &bytes).await?;

    tracing::info!(path = %target_path.display(), size = bytes.len(), "saved generated image");
    Ok(DownloadedImage {
        file_name,
        path: target_path.to_string_lossy().into_owned(),
        size: bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::image::stage_image;
    use crate::commands::test_support::memory_state;
    use crate::config::AppConfig;
    use crate::error::{CREDENTIAL_INVALID_MESSAGE, EMPTY_PROMPT_MESSAGE};
    use crate::models::StageImagePayload;
    use crate::prompt::{CharacterFields, PromptMode};
    use crate::session::GenerationStatus;
    use crate::test_support::should_skip_httpmock;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn freeform(prompt: &str) -> GenerateImagePayload {
        GenerateImagePayload {
            mode: PromptMode::Freeform,
            prompt: prompt.to_string(),
            character: CharacterFields::default(),
        }
    }

    fn config_for(server: &MockServer, key_var: &str, download_dir: &Path) -> AppConfig {
        std::env::set_var(key_var, "test-key");
        let mut config = AppConfig::default()
            .with_endpoint(server.url("/v1beta/models"))
            .with_api_key_env_vars([key_var]);
        config.download_dir = download_dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn blank_prompt_fails_without_request() {
        let state = memory_state(AppConfig::default());
        let failure = generate_image(&state, freeform("  \n"))
            .await
            .expect_err("blank prompt");
        assert_eq!(failure.message, EMPTY_PROMPT_MESSAGE);
        assert!(!failure.open_settings);
        assert_eq!(
            state.session.lock().await.status(),
            &GenerationStatus::Failed(EMPTY_PROMPT_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn save_download_writes_decoded_png() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let result = GenerationResult::new(Some("data:image/png;base64,iVBORw0KGgo=".into()), None)
            .expect("image result");

        let saved = save_download(&result, temp.path(), 1_700_000_000_000).await?;
        assert_eq!(saved.file_name, "nano-banana-gen-1700000000000.png");
        assert_eq!(
            std::fs::read(temp.path().join(&saved.file_name))?,
            vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]
        );

        let again = save_download(&result, temp.path(), 1_700_000_000_000).await?;
        assert_eq!(again.file_name, "nano-banana-gen-1700000000000-1.png");
        Ok(())
    }

    #[tokio::test]
    async fn text_only_result_cannot_be_downloaded() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let result =
            GenerationResult::new(None, Some("words".into())).expect("text result");
        assert!(matches!(
            save_download(&result, temp.path(), 1).await,
            Err(GenerationError::ImageDecode(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn generate_then_download() -> anyhow::Result<()> {
        if should_skip_httpmock() {
            return Ok(());
        }

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash-image:generateContent")
                    .body_includes("\"mimeType\":\"image/png\"")
                    .body_includes("\"text\":\"make her wave\"");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        json!({
                            "candidates": [{ "content": { "parts": [
                                { "text": "Here is your character." },
                                { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                            ]}}]
                        })
                        .to_string(),
                    );
            })
            .await;

        let temp = tempfile::tempdir()?;
        let state = memory_state(config_for(&server, "NANO_BANANA_TEST_KEY_FLOW", temp.path()));
        stage_image(
            &state,
            StageImagePayload {
                file_name: Some("ref.png".into()),
                mime_type: None,
                data_base64: "AAEC".into(),
            },
        )
        .await
        .map_err(anyhow::Error::msg)?;

        let response = generate_image(&state, freeform("make her wave"))
            .await
            .map_err(|failure| anyhow::anyhow!(failure.message))?;
        mock.assert_async().await;
        assert!(!response.used_pro_model);
        assert_eq!(
            response.result.text_response(),
            Some("Here is your character.")
        );

        let saved = download_result(&state).await.map_err(anyhow::Error::msg)?;
        assert!(saved.file_name.starts_with("nano-banana-gen-"));
        assert_eq!(saved.size, 8);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_key_asks_for_settings() -> anyhow::Result<()> {
        if should_skip_httpmock() {
            return Ok(());
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(404)
                    .body(json!({ "error": { "message": "Requested entity was not found." } }).to_string());
            })
            .await;

        let temp = tempfile::tempdir()?;
        let state = memory_state(config_for(&server, "NANO_BANANA_TEST_KEY_REJECTED", temp.path()));

        let failure = generate_image(&state, freeform("a fox"))
            .await
            .expect_err("404 must fail");
        assert!(failure.open_settings);
        assert_eq!(failure.message, CREDENTIAL_INVALID_MESSAGE);
        assert!(!state.tier.snapshot().await.credential_present);
        assert!(download_result(&state).await.is_err());
        Ok(())
    }
}
