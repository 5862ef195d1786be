use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::DEFAULT_PROXY_ORIGIN;

pub const APP_DIR: &str = "casino-mis";
pub const ENV_PROXY_ORIGIN: &str = "CASINO_MIS_PROXY_ORIGIN";
pub const ENV_DOWNLOAD_DIR: &str = "CASINO_MIS_DOWNLOAD_DIR";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Origin used for calls when the session base URL is empty.
    #[serde(default = "default_proxy_origin")]
    pub proxy_origin: String,
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Prefills the login form when no base URL was persisted.
    #[serde(default)]
    pub default_base_url: String,
}

fn default_proxy_origin() -> String {
    DEFAULT_PROXY_ORIGIN.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            proxy_origin: default_proxy_origin(),
            download_dir: None,
            default_base_url: String::new(),
        }
    }

    /// Load from the default config directory, applying environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_dir()?)
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut config = Self::read(dir)?;
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    fn read(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.json");
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&config_path)?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow!("Invalid config {}: {}", config_path.display(), e))
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(dir.join("config.json"), content)?;
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origin) = lookup(ENV_PROXY_ORIGIN).filter(|v| !v.trim().is_empty()) {
            self.proxy_origin = origin.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_DOWNLOAD_DIR).filter(|v| !v.trim().is_empty()) {
            self.download_dir = Some(PathBuf::from(dir.trim()));
        }
    }

    /// Where exports are written: configured directory, then the user's downloads, then the cwd.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn default_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join(APP_DIR))
    }

    pub fn session_path(dir: &Path) -> PathBuf {
        dir.join("session.json")
    }

    pub fn log_dir(dir: &Path) -> PathBuf {
        dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::read(dir.path()).unwrap();
        assert_eq!(config.proxy_origin, DEFAULT_PROXY_ORIGIN);
        assert_eq!(config.download_dir, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let config = Config {
            proxy_origin: "http://gateway:9000".to_string(),
            download_dir: Some(dir.path().join("exports")),
            default_base_url: "http://mis".to_string(),
        };
        config.save_to(dir.path()).unwrap();

        assert_eq!(Config::read(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let loaded: Config = serde_json::from_str(r#"{"default_base_url":"http://x"}"#).unwrap();
        assert_eq!(loaded.proxy_origin, DEFAULT_PROXY_ORIGIN);
        assert_eq!(loaded.default_base_url, "http://x");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::new();
        config.apply_env(|key| match key {
            ENV_PROXY_ORIGIN => Some(" http://env:1 ".to_string()),
            ENV_DOWNLOAD_DIR => Some("/tmp/casino".to_string()),
            _ => None,
        });
        assert_eq!(config.proxy_origin, "http://env:1");
        assert_eq!(config.download_dir(), PathBuf::from("/tmp/casino"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{").unwrap();
        assert!(Config::read(dir.path()).is_err());
    }
}
