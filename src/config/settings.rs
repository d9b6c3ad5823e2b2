use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides the API key from settings.toml.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Gemini API key. Empty means no credential is configured.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound on a single model call, including connect time.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Additional attempts after a transport failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,
    #[serde(default = "default_chat_top_p")]
    pub chat_top_p: f32,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_chat_temperature() -> f32 {
    0.7
}

fn default_chat_top_p() -> f32 {
    0.95
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            chat_temperature: default_chat_temperature(),
            chat_top_p: default_chat_top_p(),
        }
    }
}

fn get_settings_path() -> PathBuf {
    // Use platform-specific app data directory
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support/com.bagrut.coach");
            dir.push("settings.toml");
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push("com.bagrut.coach");
            dir.push("settings.toml");
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share/com.bagrut.coach");
            dir.push("settings.toml");
            return dir;
        }
    }

    // Fallback
    PathBuf::from("settings.toml")
}

fn load_settings_internal() -> Settings {
    let settings_path = get_settings_path();

    // Try to load from the settings file; missing fields fall back to
    // their defaults, so a file holding only the API key is enough.
    let mut settings = if let Ok(content) = fs::read_to_string(&settings_path) {
        match toml::from_str::<Settings>(&content) {
            Ok(settings) => {
                eprintln!("[Config] Loaded settings from: {:?}", settings_path);
                settings
            }
            Err(_) => {
                eprintln!("[Config] Failed to parse settings.toml, using defaults");
                Settings::default()
            }
        }
    } else {
        eprintln!("[Config] No settings file found, using defaults");
        Settings::default()
    };

    // The environment always wins for the credential
    if let Ok(key) = std::env::var(API_KEY_ENV_VAR) {
        if !key.trim().is_empty() {
            eprintln!("[Config] API key taken from {}", API_KEY_ENV_VAR);
            settings.api_key = key.trim().to_string();
        }
    }

    settings
}

lazy_static! {
    static ref SETTINGS: Settings = load_settings_internal();
}

/// Get the cached settings (loaded once at startup)
pub fn get_settings() -> &'static Settings {
    &SETTINGS
}
