use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:5001";
pub const API_URL_ENV: &str = "XLCHAT_API_URL";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the spreadsheet query backend.
    pub api_base_url: String,
    /// Where conversations and the log file live.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("xlchat").join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("xlchat"))
        .unwrap_or_else(|| PathBuf::from(".xlchat"))
}

impl Config {
    /// Config file (if any), then `XLCHAT_API_URL`.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        config.api_base_url = normalize_base_url(&config.api_base_url);
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = normalize_base_url(&url);
        }
    }

    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.api_base_url = normalize_base_url(&url);
        }
        self
    }

    pub fn conversations_path(&self) -> PathBuf {
        self.data_dir.join("conversations.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("xlchat.log")
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
