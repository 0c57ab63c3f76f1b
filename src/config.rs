use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub server_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config, writing a default file on first run.
    pub fn load_or_create() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let config = Self::new();
            config.save_to(&path)?;
            return Ok(config);
        }
        Self::load_from(&path)
    }

    /// Base URL to talk to, preferring an explicit override (flag or
    /// env var) over the config file, falling back to the default.
    pub fn resolve_server_url(&self, override_url: Option<String>) -> String {
        override_url
            .or_else(|| self.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    fn load_from(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Directory holding the config file and the log file.
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("cdp-chat"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            server_url: Some("http://10.0.0.5:8000".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server_url.as_deref(), Some("http://10.0.0.5:8000"));
    }

    #[test]
    fn test_default_config_serializes_null_server() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        Config::new().save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.server_url.is_none());
    }

    #[test]
    fn test_resolve_server_url_precedence() {
        let config = Config {
            server_url: Some("http://from-config:8000".to_string()),
        };
        assert_eq!(
            config.resolve_server_url(Some("http://from-flag:8000".to_string())),
            "http://from-flag:8000"
        );
        assert_eq!(config.resolve_server_url(None), "http://from-config:8000");
        assert_eq!(Config::new().resolve_server_url(None), DEFAULT_SERVER_URL);
    }
}
