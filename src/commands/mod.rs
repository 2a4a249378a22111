//! View-facing commands. Each returns a serialisable payload or a user-facing message.

pub mod generate;
pub mod image;
pub mod prompts;
pub mod settings;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::credentials::{CredentialCapability, JsonFileStore, PreferenceStore, TierState};
use crate::error::Result;
use crate::models::TierSnapshot;
use crate::orchestrator::Generator;
use crate::session::GenerationSession;

/// Process-wide state shared by every command; built once at startup.
pub struct AppState {
    pub(crate) tier: TierState,
    pub(crate) generator: Generator,
    pub(crate) session: Mutex<GenerationSession>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        capability: CredentialCapability,
        store: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            tier: TierState::new(capability, store),
            generator: Generator::new(config),
            session: Mutex::new(GenerationSession::default()),
        }
    }

    /// Builds the state with the file-backed preference store from `config` and restores
    /// the tier settings.
    pub async fn init(config: AppConfig, capability: CredentialCapability) -> Result<(Self, TierSnapshot)> {
        let store = Arc::new(JsonFileStore::new(config.preferences_path.clone()));
        let state = Self::new(config, capability, store);
        let snapshot = state.tier.restore().await?;
        Ok((state, snapshot))
    }

    pub fn config(&self) -> &AppConfig {
        self.generator.config()
    }
}
