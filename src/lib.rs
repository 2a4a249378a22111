//! Character image generation backend.
//!
//! The functions in [`commands`] take an [`AppState`] and return view-ready payloads or
//! `String` errors, so a desktop shell can expose each one as a thin handler. With Tauri:
//!
//! ```ignore
//! #[tauri::command]
//! async fn toggle_pro_model(state: tauri::State<'_, nano_banana::AppState>)
//!     -> Result<nano_banana::TierSnapshot, String> {
//!     nano_banana::toggle_pro_model(&state).await
//! }
//!
//! #[tauri::command]
//! async fn generate_image(
//!     state: tauri::State<'_, nano_banana::AppState>,
//!     payload: nano_banana::GenerateImagePayload,
//! ) -> Result<nano_banana::GenerateImageResponsePayload, nano_banana::GenerateFailure> {
//!     nano_banana::generate_image(&state, payload).await
//! }
//!
//! // setup: AppState::init(AppConfig::from_env(), capability).await, then app.manage(state)
//! tauri::Builder::default()
//!     .invoke_handler(tauri::generate_handler![toggle_pro_model, generate_image])
//!     .run(tauri::generate_context!())?;
//! ```

pub mod commands;
mod config;
mod constants;
mod credentials;
mod error;
mod fs_utils;
mod intake;
mod models;
mod orchestrator;
mod prompt;
mod session;

#[cfg(test)]
mod test_support;

pub use commands::generate::{download_result, generate_image, save_download, GenerateFailure};
pub use commands::image::{reset, stage_image, stage_image_from_path};
pub use commands::prompts::{default_character_fields, preview_prompt};
pub use commands::settings::{connect_key, restore_settings, settings_snapshot, toggle_pro_model};
pub use commands::AppState;

pub use config::AppConfig;
pub use constants::{
    DEFAULT_GEMINI_ENDPOINT, PRODUCT_SLUG, PRO_IMAGE_MODEL, PRO_IMAGE_SIZE, PRO_PREFERENCE_KEY,
    STANDARD_IMAGE_MODEL,
};
pub use credentials::{
    CredentialCapability, CredentialHost, EnvKeyHost, JsonFileStore, MemoryStore,
    PreferenceStore, SelectionHook, TierState,
};
pub use error::{classify_failure, GenerationError, Result};
pub use fs_utils::download_filename;
pub use intake::{decode_data_uri, stage_image_bytes, stage_image_file, stage_image_payload};
pub use models::{
    DownloadedImage, GenerateImagePayload, GenerateImageResponsePayload, GenerationResult,
    ImageReference, PromptRequest, StageImagePayload, TierSnapshot,
};
pub use orchestrator::{build_parts, extract_result, Generator, ModelSelection};
pub use prompt::{compose_character_prompt, compose_prompt, CharacterFields, PromptMode};
pub use session::{GenerationSession, GenerationStatus, RequestTicket};

const DEFAULT_LOG_FILTER: &str = "nano_banana=info,llmapi=info";

/// Installs a `tracing` subscriber filtered by `RUST_LOG`. Safe to call more than once.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
