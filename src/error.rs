use thiserror::Error;

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a description or fill in the character fields.";
pub const CREDENTIAL_INVALID_MESSAGE: &str =
    "API key verification failed or the key is invalid. Please re-link your API key in settings.";
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred during generation.";

const CREDENTIAL_MARKERS: [&str; 3] = ["Requested entity was not found", "404", "403"];

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt is empty")]
    Validation,
    #[error("image decode failed: {0}")]
    ImageDecode(String),
    #[error("credential rejected: {0}")]
    CredentialInvalid(String),
    #[error("No content generated from the model.")]
    EmptyGeneration,
    #[error("{0}")]
    GenerationFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference store error: {0}")]
    Preferences(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;

impl GenerationError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Validation => EMPTY_PROMPT_MESSAGE.to_string(),
            GenerationError::ImageDecode(detail) => {
                format!("The selected image could not be read: {detail}")
            }
            GenerationError::CredentialInvalid(_) => CREDENTIAL_INVALID_MESSAGE.to_string(),
            GenerationError::EmptyGeneration => GENERIC_FAILURE_MESSAGE.to_string(),
            GenerationError::GenerationFailed(message) if message.trim().is_empty() => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            GenerationError::GenerationFailed(message) => message.clone(),
            GenerationError::Io(err) => err.to_string(),
            GenerationError::Preferences(message) => message.clone(),
        }
    }

    pub fn is_credential_invalid(&self) -> bool {
        matches!(self, GenerationError::CredentialInvalid(_))
    }
}

/// Maps a client-layer failure onto the user-facing taxonomy.
pub fn classify_failure(err: &anyhow::Error) -> GenerationError {
    let description = format!("{err:#}");
    if CREDENTIAL_MARKERS
        .iter()
        .any(|marker| description.contains(marker))
    {
        GenerationError::CredentialInvalid(description)
    } else {
        GenerationError::GenerationFailed(description)
    }
}
