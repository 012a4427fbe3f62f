use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "http://localhost:3001";
pub const API_BASE_ENV: &str = "ANISTREAM_API_BASE_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_theme_dark")]
    pub theme_dark: bool,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base(),
            theme_dark: true,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_theme_dark() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl AppSettings {
    /// Loads persisted settings and applies the environment override for the
    /// API base URL. Falls back to defaults when the file is missing or broken.
    pub fn load() -> Self {
        let mut settings = match config_dir() {
            Some(dir) => match load_from(&dir.join("settings.json")) {
                Ok(s) => s,
                Err(err) => {
                    tracing::debug!("using default settings: {err:#}");
                    AppSettings::default()
                }
            },
            None => AppSettings::default(),
        };
        if let Some(base) = env_api_base() {
            settings.api_base_url = base;
        }
        settings
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let dir = config_dir().context("no config directory on this platform")?;
        save_to(&dir.join("settings.json"), self)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// `<config_dir>/anistream`, shared by settings, session and history files.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("anistream"))
}

fn env_api_base() -> Option<String> {
    std::env::var(API_BASE_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| normalize_host(&v))
}

pub fn load_from(path: &Path) -> anyhow::Result<AppSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read settings at {}", path.display()))?;
    let mut settings: AppSettings =
        serde_json::from_str(&contents).context("parse settings")?;
    settings.api_base_url = normalize_host(&settings.api_base_url);
    Ok(settings)
}

pub fn save_to(path: &Path, settings: &AppSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let mut normalized = settings.clone();
    normalized.api_base_url = normalize_host(&normalized.api_base_url);
    let json = serde_json::to_string_pretty(&normalized).context("serialize settings")?;
    fs::write(path, json).context("write settings")
}

pub fn normalize_host(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        DEFAULT_API_BASE.into()
    } else {
        trimmed.trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_slashes_and_whitespace() {
        assert_eq!(normalize_host("  https://api.example.test//  "), "https://api.example.test");
        assert_eq!(normalize_host(""), DEFAULT_API_BASE);
        assert_eq!(normalize_host("   "), DEFAULT_API_BASE);
    }

    #[test]
    fn save_then_load_normalizes_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            api_base_url: "https://api.example.test/".into(),
            theme_dark: false,
            request_timeout_secs: 5,
        };
        save_to(&path, &settings).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, "https://api.example.test");
        assert!(!loaded.theme_dark);
        assert_eq!(loaded.request_timeout_secs, 5);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"theme_dark": false}"#).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, DEFAULT_API_BASE);
        assert_eq!(loaded.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!loaded.theme_dark);
    }

    #[test]
    fn timeout_is_never_zero() {
        let settings = AppSettings {
            request_timeout_secs: 0,
            ..AppSettings::default()
        };
        assert_eq!(settings.timeout(), std::time::Duration::from_secs(1));
    }
}
