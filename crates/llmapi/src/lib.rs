pub mod providers;
pub mod types;
pub mod utils;

pub use providers::gemini::{GeminiResponse, GenerationConfig, ImageConfig, send_generate_request};
pub use types::{LLMClient, LLMMessage, LLMMessageType, LLMUserType};
