use std::env;
use std::path::PathBuf;

use crate::constants::{
    API_KEY_ENV_VARS, APP_DIR_NAME, DEFAULT_GEMINI_ENDPOINT, PREFERENCES_FILE, PRO_IMAGE_MODEL,
    PRO_IMAGE_SIZE, STANDARD_IMAGE_MODEL,
};

pub const ENDPOINT_ENV: &str = "NANO_BANANA_ENDPOINT";
pub const PREFERENCES_ENV: &str = "NANO_BANANA_PREFS";
pub const DOWNLOAD_DIR_ENV: &str = "NANO_BANANA_DOWNLOAD_DIR";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: String,
    pub standard_model: String,
    pub pro_model: String,
    pub pro_image_size: String,
    /// Checked in order each time a request is built.
    pub api_key_env_vars: Vec<String>,
    pub preferences_path: PathBuf,
    pub download_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            standard_model: STANDARD_IMAGE_MODEL.to_string(),
            pro_model: PRO_IMAGE_MODEL.to_string(),
            pro_image_size: PRO_IMAGE_SIZE.to_string(),
            api_key_env_vars: API_KEY_ENV_VARS.iter().map(|name| name.to_string()).collect(),
            preferences_path: default_preferences_path(),
            download_dir: default_download_dir(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(endpoint) = non_blank_env(ENDPOINT_ENV) {
            config.endpoint = endpoint;
        }
        if let Some(path) = non_blank_env(PREFERENCES_ENV) {
            config.preferences_path = PathBuf::from(path);
        }
        if let Some(dir) = non_blank_env(DOWNLOAD_DIR_ENV) {
            config.download_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_key_env_vars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_key_env_vars = names.into_iter().map(Into::into).collect();
        self
    }

    /// Reads the active api key from the process environment. Never cached.
    pub fn current_api_key(&self) -> Option<String> {
        self.api_key_env_vars
            .iter()
            .find_map(|name| non_blank_env(name))
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_preferences_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PREFERENCES_FILE)
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}
