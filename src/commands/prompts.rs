use crate::error::GenerationError;
use crate::models::GenerateImagePayload;
use crate::prompt::{compose_prompt, CharacterFields};

/// Prompt the model would receive for this form state, or the empty-prompt message.
pub fn preview_prompt(payload: &GenerateImagePayload) -> Result<String, String> {
    let prompt = compose_prompt(payload.mode, &payload.prompt, &payload.character);
    if prompt.trim().is_empty() {
        return Err(GenerationError::Validation.user_message());
    }
    Ok(prompt)
}

pub fn default_character_fields() -> CharacterFields {
    CharacterFields::default()
}
