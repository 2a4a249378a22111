use llmapi::providers::gemini::{GeminiResponse, GenerationConfig, send_generate_request};
use llmapi::types::{LLMClient, LLMMessage, LLMMessageType};

use crate::config::AppConfig;
use crate::constants::GENERATED_IMAGE_MIME;
use crate::error::{classify_failure, GenerationError, Result};
use crate::models::{GenerationResult, PromptRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: String,
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone)]
pub struct Generator {
    config: AppConfig,
}

impl Generator {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// High-quality model with a fixed image size when `use_pro`, otherwise the standard
    /// model with no generation config.
    pub fn select_model(&self, use_pro: bool) -> ModelSelection {
        if use_pro {
            ModelSelection {
                model: self.config.pro_model.clone(),
                generation_config: Some(GenerationConfig::with_image_size(
                    self.config.pro_image_size.clone(),
                )),
            }
        } else {
            ModelSelection {
                model: self.config.standard_model.clone(),
                generation_config: None,
            }
        }
    }

    /// Issues exactly one generation request.
    ///
    /// The client is rebuilt on every call so a key linked mid-session is picked up.
    pub async fn generate(&self, request: &PromptRequest) -> Result<GenerationResult> {
        if request.prompt().trim().is_empty() {
            return Err(GenerationError::Validation);
        }

        let selection = self.select_model(request.use_pro());
        let api_key = self.config.current_api_key().ok_or_else(|| {
            GenerationError::CredentialInvalid("no API key is configured".to_string())
        })?;

        let client = LLMClient::new(api_key, self.config.endpoint.clone(), selection.model.clone())
            .with_generation_config(selection.generation_config);
        let messages = vec![LLMMessage::user(build_parts(request))];

        tracing::debug!(
            model = %selection.model,
            has_image = request.image().is_some(),
            prompt_chars = request.prompt().chars().count(),
            "building generation request"
        );

        let response = match send_generate_request(&client, messages).await {
            Ok(response) => response,
            Err(err) => {
                let classified = classify_failure(&err);
                tracing::warn!(model = %selection.model, error = %classified, "generation failed");
                return Err(classified);
            }
        };

        let result = extract_result(&response)?;
        tracing::info!(
            model = %selection.model,
            has_image = result.has_image(),
            has_text = result.text_response().is_some(),
            "generation succeeded"
        );
        Ok(result)
    }
}

/// Inline image first when present, then the prompt text.
pub fn build_parts(request: &PromptRequest) -> Vec<LLMMessageType> {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = request.image() {
        parts.push(LLMMessageType::image_b64(image.base64_data(), image.mime_type()));
    }
    parts.push(LLMMessageType::text(request.prompt()));
    parts
}

/// Scans every part of the first candidate; the last image and the last text win.
pub fn extract_result(response: &GeminiResponse) -> Result<GenerationResult> {
    let mut image_url: Option<String> = None;
    let mut text_output: Option<String> = None;

    for part in response.first_candidate_parts() {
        match (&part.inline_data, &part.text) {
            (Some(inline), _) if !inline.data.is_empty() => {
                image_url = Some(format!("data:{GENERATED_IMAGE_MIME};base64,{}", inline.data));
            }
            (_, Some(text)) if !text.is_empty() => {
                text_output = Some(text.clone());
            }
            _ => {}
        }
    }

    GenerationResult::new(image_url, text_output).ok_or(GenerationError::EmptyGeneration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::stage_image_bytes;
    use crate::test_support::should_skip_httpmock;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn response(value: serde_json::Value) -> GeminiResponse {
        serde_json::from_value(value).expect("valid response fixture")
    }

    fn generator_for(server: &MockServer, key_var: &str) -> Generator {
        std::env::set_var(key_var, "test-key");
        Generator::new(
            AppConfig::default()
                .with_endpoint(server.url("/v1beta/models"))
                .with_api_key_env_vars([key_var]),
        )
    }

    #[test]
    fn image_and_text_parts_fill_both_fields() -> Result<()> {
        let result = extract_result(&response(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/jpeg", "data": "AAAA" } },
                { "text": "a cheerful chibi" }
            ]}}]
        })))?;
        assert_eq!(result.image_url(), Some("data:image/png;base64,AAAA"));
        assert_eq!(result.text_response(), Some("a cheerful chibi"));
        Ok(())
    }

    #[test]
    fn later_parts_overwrite_earlier_ones() -> Result<()> {
        let result = extract_result(&response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "first" },
                { "inlineData": { "mimeType": "image/png", "data": "ONE" } },
                { "inlineData": { "mimeType": "image/png", "data": "TWO" } },
                { "text": "second" }
            ]}}]
        })))?;
        assert_eq!(result.image_url(), Some("data:image/png;base64,TWO"));
        assert_eq!(result.text_response(), Some("second"));
        Ok(())
    }

    #[test]
    fn zero_parts_is_empty_generation() {
        let empty = response(json!({ "candidates": [{ "content": { "parts": [] } }] }));
        assert!(matches!(extract_result(&empty), Err(GenerationError::EmptyGeneration)));

        let no_candidates = response(json!({}));
        assert!(matches!(
            extract_result(&no_candidates),
            Err(GenerationError::EmptyGeneration)
        ));
    }

    #[test]
    fn model_selection_follows_tier() {
        let generator = Generator::new(AppConfig::default());

        let standard = generator.select_model(false);
        assert_eq!(standard.model, "gemini-2.5-flash-image");
        assert_eq!(standard.generation_config, None);

        let pro = generator.select_model(true);
        assert_eq!(pro.model, "gemini-3-pro-image-preview");
        assert_eq!(pro.generation_config, Some(GenerationConfig::with_image_size("1K")));
    }

    #[test]
    fn image_part_precedes_prompt() -> Result<()> {
        let image = stage_image_bytes(&[1, 2, 3], "image/webp".into(), None);
        let request = PromptRequest::new("make it chibi", Some(image), false)?;
        assert_eq!(
            build_parts(&request),
            vec![
                LLMMessageType::image_b64("AQID", "image/webp"),
                LLMMessageType::text("make it chibi"),
            ]
        );

        let text_only = PromptRequest::new("just text", None, false)?;
        assert_eq!(build_parts(&text_only), vec![LLMMessageType::text("just text")]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_key_is_credential_error() -> Result<()> {
        let generator = Generator::new(
            AppConfig::default().with_api_key_env_vars(["NANO_BANANA_TEST_KEY_UNSET"]),
        );
        let request = PromptRequest::new("a cat", None, false)?;
        let err = generator.generate(&request).await.expect_err("no key");
        assert!(err.is_credential_invalid());
        Ok(())
    }

    #[tokio::test]
    async fn pro_request_uses_pro_model_and_image_size() -> anyhow::Result<()> {
        if should_skip_httpmock() {
            return Ok(());
        }

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-3-pro-image-preview:generateContent")
                    .header("x-goog-api-key", "test-key")
                    .body_includes("\"imageSize\":\"1K\"")
                    .body_includes("\"mimeType\":\"image/png\"");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        json!({
                            "candidates": [{ "content": { "parts": [
                                { "inlineData": { "mimeType": "image/png", "data": "iVBOR" } }
                            ]}}]
                        })
                        .to_string(),
                    );
            })
            .await;

        let generator = generator_for(&server, "NANO_BANANA_TEST_KEY_PRO");
        let image = stage_image_bytes(b"png", "image/png".into(), Some("ref.png".into()));
        let request = PromptRequest::new("repaint", Some(image), true)?;

        let result = generator.generate(&request).await?;
        mock.assert_async().await;
        assert_eq!(result.image_url(), Some("data:image/png;base64,iVBOR"));
        assert_eq!(result.text_response(), None);
        Ok(())
    }

    #[tokio::test]
    async fn standard_request_hits_flash_model() -> anyhow::Result<()> {
        if should_skip_httpmock() {
            return Ok(());
        }

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash-image:generateContent")
                    .body_includes("\"text\":\"a fox\"");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        json!({
                            "candidates": [{ "content": { "parts": [{ "text": "no image today" }] } }]
                        })
                        .to_string(),
                    );
            })
            .await;

        let generator = generator_for(&server, "NANO_BANANA_TEST_KEY_STANDARD");
        let result = generator
            .generate(&PromptRequest::new("a fox", None, false)?)
            .await?;
        mock.assert_async().await;
        assert_eq!(result.image_url(), None);
        assert_eq!(result.text_response(), Some("no image today"));
        Ok(())
    }

    #[tokio::test]
    async fn forbidden_response_is_credential_error() -> anyhow::Result<()> {
        if should_skip_httpmock() {
            return Ok(());
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(403).body(
                    json!({ "error": { "code": 403, "message": "Requested entity was not found." } })
                        .to_string(),
                );
            })
            .await;

        let generator = generator_for(&server, "NANO_BANANA_TEST_KEY_FORBIDDEN");
        let err = generator
            .generate(&PromptRequest::new("a fox", None, true)?)
            .await
            .expect_err("403 must fail");
        assert!(err.is_credential_invalid());
        Ok(())
    }

    #[tokio::test]
    async fn server_error_keeps_underlying_message() -> anyhow::Result<()> {
        if should_skip_httpmock() {
            return Ok(());
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(500).body("model overloaded");
            })
            .await;

        let generator = generator_for(&server, "NANO_BANANA_TEST_KEY_OVERLOAD");
        let err = generator
            .generate(&PromptRequest::new("a fox", None, false)?)
            .await
            .expect_err("500 must fail");
        match err {
            GenerationError::GenerationFailed(message) => assert!(message.contains("model overloaded")),
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn empty_candidates_from_server_is_empty_generation() -> anyhow::Result<()> {
        if should_skip_httpmock() {
            return Ok(());
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .header("content-type", "application/json")
                    .body(json!({ "candidates": [] }).to_string());
            })
            .await;

        let generator = generator_for(&server, "NANO_BANANA_TEST_KEY_EMPTY");
        let err = generator
            .generate(&PromptRequest::new("a fox", None, false)?)
            .await
            .expect_err("nothing generated");
        assert!(matches!(err, GenerationError::EmptyGeneration));
        Ok(())
    }
}
