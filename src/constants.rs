pub const STANDARD_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const PRO_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const PRO_IMAGE_SIZE: &str = "1K";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_IMAGE_MIME: &str = "image/png";
pub const GENERATED_IMAGE_MIME: &str = "image/png";
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];
pub const PRO_PREFERENCE_KEY: &str = "nanoBanana_usePro";
pub const PRODUCT_SLUG: &str = "nano-banana";
pub const APP_DIR_NAME: &str = "nano-banana";
pub const PREFERENCES_FILE: &str = "preferences.json";
