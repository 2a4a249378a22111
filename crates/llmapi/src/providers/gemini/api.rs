use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{Value, json};

use crate::types::{LLMClient, LLMMessage, LLMMessageType};

use super::models::{GeminiResponse, GenerationConfig};

pub fn convert_body_parts_gemini(body_part: Vec<LLMMessageType>) -> Vec<Value> {
    body_part
        .into_iter()
        .map(|part| match part {
            LLMMessageType::TEXT(text) => json!({ "text": text }),
            LLMMessageType::IMAGE {
                data_b64,
                mime_type,
            } => json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": data_b64
                }
            }),
        })
        .collect()
}

pub fn convert_messages_to_gemini_contents(messages: Vec<LLMMessage>) -> Vec<Value> {
    messages
        .into_iter()
        .map(|m| {
            let role = m.role.as_gemini_role();
            json!({
                "role": role,
                "parts": convert_body_parts_gemini(m.content)
            })
        })
        .collect()
}

pub fn build_generate_body(
    messages: Vec<LLMMessage>,
    generation_config: Option<&GenerationConfig>,
) -> Result<Value> {
    let mut body = json!({
        "contents": convert_messages_to_gemini_contents(messages)
    });

    if let Some(config) = generation_config {
        body["generationConfig"] =
            serde_json::to_value(config).context("Failed to encode generation config")?;
    }

    Ok(body)
}

pub fn generate_url(api_client: &LLMClient) -> String {
    let endpoint = api_client.endpoint().trim_end_matches('/');
    let model = api_client.default_model();
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!("{}/{}:generateContent", endpoint, model)
}

/// Issues one `generateContent` call.
///
/// A non-success status becomes an error carrying the status line and the raw body, so
/// callers can tell credential rejections apart from other failures.
pub async fn send_generate_request(
    api_client: &LLMClient,
    messages: Vec<LLMMessage>,
) -> Result<GeminiResponse> {
    let url = generate_url(api_client);
    let body = build_generate_body(messages, api_client.generation_config())?;

    tracing::debug!(
        model = api_client.default_model(),
        image_config = api_client.generation_config().is_some(),
        "sending Gemini generateContent request"
    );

    let client = Client::new();
    let response = client
        .post(&url)
        .header("x-goog-api-key", api_client.api_key())
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .context("HTTP request failed")?;

    let status = response.status();
    let response_text = response
        .text()
        .await
        .context("Reading response body failed")?;

    if !status.is_success() {
        return Err(anyhow::anyhow!(
            "Gemini generateContent failed: status {} body {}",
            status,
            response_text
        ));
    }

    let response: GeminiResponse = serde_json::from_str(&response_text).with_context(|| {
        format!(
            "Failed to decode Gemini response JSON. Raw response: {}",
            response_text
        )
    })?;

    Ok(response)
}
