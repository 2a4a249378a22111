//! Tier preference and live credential state.
//!
//! The persisted preference says whether the user wants the high-quality model; the host
//! credential capability says whether a usable key is actually selected. [`TierState`]
//! reconciles the two. Flag updates are serialized behind one lock; the lock is not held
//! while the host selection dialog is open, so readers never wait on the user.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;

use crate::config::AppConfig;
use crate::constants::PRO_PREFERENCE_KEY;
use crate::error::{GenerationError, Result};
use crate::models::TierSnapshot;

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// String preferences kept in a single JSON object file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Map<String, Value> {
        fs::read_to_string(&self.path)
            .await
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl PreferenceStore for JsonFileStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.read_all()
            .await
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut payload = self.read_all().await;
        payload.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let text = serde_json::to_string_pretty(&Value::Object(payload)).map_err(|err| {
            GenerationError::Preferences(format!("unable to serialise preferences: {err}"))
        })?;
        fs::write(&self.path, text).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .lock()
            .insert(key.to_string(), value.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Host-side key selection, e.g. a settings dialog that links an API key.
#[async_trait]
pub trait CredentialHost: Send + Sync {
    async fn has_selected_credential(&self) -> bool;
    /// Opens the selection flow and returns once the user completes or cancels it.
    async fn open_select_credential(&self);
}

#[derive(Clone)]
pub enum CredentialCapability {
    Present(Arc<dyn CredentialHost>),
    Absent,
}

impl CredentialCapability {
    pub fn present(host: impl CredentialHost + 'static) -> Self {
        CredentialCapability::Present(Arc::new(host))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, CredentialCapability::Present(_))
    }

    async fn has_selected(&self) -> bool {
        match self {
            CredentialCapability::Present(host) => host.has_selected_credential().await,
            CredentialCapability::Absent => false,
        }
    }
}

pub type SelectionHook = Arc<dyn Fn() + Send + Sync>;

/// Treats a non-blank api key in the configured environment variables as a selected
/// credential. Selection delegates to an optional hook supplied by the host shell.
#[derive(Clone)]
pub struct EnvKeyHost {
    config: AppConfig,
    on_select: Option<SelectionHook>,
}

impl EnvKeyHost {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            on_select: None,
        }
    }

    pub fn with_selection_hook(mut self, hook: SelectionHook) -> Self {
        self.on_select = Some(hook);
        self
    }
}

#[async_trait]
impl CredentialHost for EnvKeyHost {
    async fn has_selected_credential(&self) -> bool {
        self.config.current_api_key().is_some()
    }

    async fn open_select_credential(&self) {
        if let Some(hook) = &self.on_select {
            hook();
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct TierFlags {
    tier_enabled: bool,
    credential_present: bool,
}

impl TierFlags {
    fn snapshot(&self) -> TierSnapshot {
        TierSnapshot {
            tier_enabled: self.tier_enabled,
            credential_present: self.credential_present,
        }
    }
}

pub struct TierState {
    capability: CredentialCapability,
    store: Arc<dyn PreferenceStore>,
    flags: tokio::sync::Mutex<TierFlags>,
}

impl TierState {
    pub fn new(capability: CredentialCapability, store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            capability,
            store,
            flags: tokio::sync::Mutex::new(TierFlags::default()),
        }
    }

    pub async fn snapshot(&self) -> TierSnapshot {
        self.flags.lock().await.snapshot()
    }

    /// Startup reconciliation of the stored preference against live credential presence.
    ///
    /// A stored `"true"` with no live credential is demoted in memory and in the store. A
    /// store that cannot be written does not fail the restore.
    pub async fn restore(&self) -> Result<TierSnapshot> {
        let mut flags = self.flags.lock().await;

        if !self.capability.is_available() {
            tracing::debug!("credential capability unavailable; tier left unchanged");
            flags.credential_present = false;
            return Ok(flags.snapshot());
        }

        let has_key = self.capability.has_selected().await;
        flags.credential_present = has_key;

        let saved_pro = self.stored_preference().await;
        if saved_pro && has_key {
            flags.tier_enabled = true;
        } else if saved_pro {
            tracing::warn!("stored high-quality preference has no live credential; demoting");
            flags.tier_enabled = false;
            // The demotion holds in memory even when the write fails.
            if let Err(err) = self.persist(false).await {
                tracing::warn!(error = %err, "failed to persist tier demotion");
            }
        }

        tracing::info!(
            tier_enabled = flags.tier_enabled,
            credential_present = flags.credential_present,
            "restored tier settings"
        );
        Ok(flags.snapshot())
    }

    /// Runs the host selection flow and enables the high-quality tier if a key is now present.
    pub async fn request_credential(&self) -> Result<bool> {
        let CredentialCapability::Present(host) = &self.capability else {
            return Ok(false);
        };

        // No lock while the dialog is open.
        host.open_select_credential().await;
        let has_key = host.has_selected_credential().await;

        let mut flags = self.flags.lock().await;
        flags.credential_present = has_key;
        if has_key {
            self.persist(true).await?;
            flags.tier_enabled = true;
            tracing::info!("credential linked; high-quality tier enabled");
        }

        Ok(has_key)
    }

    /// Flips the tier, persists the new value, and asks for a credential when enabling
    /// without one. The in-memory tier only changes once the store accepted the write.
    pub async fn toggle_tier(&self) -> Result<bool> {
        let needs_credential = {
            let mut flags = self.flags.lock().await;

            if !self.capability.is_available() {
                tracing::debug!("credential capability unavailable; toggle ignored");
                return Ok(flags.tier_enabled);
            }

            let enabled = !flags.tier_enabled;
            self.persist(enabled).await?;
            flags.tier_enabled = enabled;
            tracing::info!(tier_enabled = enabled, "tier toggled");

            enabled && !self.capability.has_selected().await
        };

        if needs_credential {
            self.request_credential().await?;
        }

        Ok(self.flags.lock().await.tier_enabled)
    }

    /// Called when the endpoint rejected the current key.
    pub async fn mark_credential_invalid(&self) {
        let mut flags = self.flags.lock().await;
        if flags.credential_present {
            tracing::warn!("credential rejected by the generation endpoint");
        }
        flags.credential_present = false;
    }

    async fn stored_preference(&self) -> bool {
        self.store.get(PRO_PREFERENCE_KEY).await.as_deref() == Some("true")
    }

    async fn persist(&self, enabled: bool) -> Result<()> {
        self.store
            .set(PRO_PREFERENCE_KEY, if enabled { "true" } else { "false" })
            .await
    }
}
