mod api;
pub mod models;

pub use api::{
    build_generate_body, convert_messages_to_gemini_contents, generate_url,
    send_generate_request,
};
pub use models::{GeminiResponse, GenerationConfig, ImageConfig, InlineData, Part};
