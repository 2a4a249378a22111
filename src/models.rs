use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::prompt::{CharacterFields, PromptMode};

/// A user-supplied image staged for submission.
///
/// Both encodings are produced from the same bytes in [`crate::intake`]; the fields are
/// private so they cannot drift apart afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    file_name: Option<String>,
    preview_url: String,
    base64_data: String,
    mime_type: String,
}

impl ImageReference {
    pub(crate) fn new(file_name: Option<String>, mime_type: String, base64_data: String) -> Self {
        let preview_url = format!("data:{mime_type};base64,{base64_data}");
        Self {
            file_name,
            preview_url,
            base64_data,
            mime_type,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Display form: `data:<mime>;base64,<payload>`.
    pub fn preview_url(&self) -> &str {
        &self.preview_url
    }

    /// Transport form: the base64 body without the data URI prefix.
    pub fn base64_data(&self) -> &str {
        &self.base64_data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    prompt: String,
    image: Option<ImageReference>,
    use_pro: bool,
}

impl PromptRequest {
    pub fn new(prompt: &str, image: Option<ImageReference>, use_pro: bool) -> Result<Self> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::Validation);
        }
        Ok(Self {
            prompt: prompt.to_string(),
            image,
            use_pro,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn image(&self) -> Option<&ImageReference> {
        self.image.as_ref()
    }

    pub fn use_pro(&self) -> bool {
        self.use_pro
    }
}

/// Outcome of a successful generation; always carries an image, text, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    image_url: Option<String>,
    text_response: Option<String>,
}

impl GenerationResult {
    /// `None` when neither field is set; such a response is a failure, not a result.
    pub fn new(image_url: Option<String>, text_response: Option<String>) -> Option<Self> {
        if image_url.is_none() && text_response.is_none() {
            return None;
        }
        Some(Self {
            image_url,
            text_response,
        })
    }

    /// `data:image/png;base64,...` of the first image part.
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn text_response(&self) -> Option<&str> {
        self.text_response.as_deref()
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSnapshot {
    pub tier_enabled: bool,
    pub credential_present: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageImagePayload {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub data_base64: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagePayload {
    pub mode: PromptMode,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub character: CharacterFields,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponsePayload {
    pub result: GenerationResult,
    pub used_pro_model: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedImage {
    pub file_name: String,
    pub path: String,
    pub size: u64,
}
