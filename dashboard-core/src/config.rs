use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::error::DashboardError;

/// Environment variable that overrides `base_url`.
pub const BASE_URL_ENV: &str = "WEATHER_API_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "/api/v1";
pub const DEFAULT_HOST: &str = "http://localhost:9091";
pub const DEFAULT_USERNAME: &str = "user";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// host = "http://localhost:9091"
/// base_url = "/api/v1"
/// username = "user"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Origin that a relative `base_url` is resolved against.
    #[serde(default = "default_host")]
    pub host: String,

    /// API root, either absolute or a path below `host`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Username pre-filled for every request. Passwords are never stored.
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            base_url: default_base_url(),
            username: default_username(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet,
    /// then apply the environment override.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_base_url_override(std::env::var(BASE_URL_ENV).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Blank overrides are ignored, like an unset variable.
    pub fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.base_url = value.trim().to_string();
        }
    }

    /// Absolute URL every endpoint path is appended to.
    pub fn api_base(&self) -> Result<Url, DashboardError> {
        let url = match Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(_) => {
                let host = Url::parse(&self.host).map_err(|e| {
                    DashboardError::Config(format!("host '{}' is not a valid URL: {e}", self.host))
                })?;
                host.join(&self.base_url).map_err(|e| {
                    DashboardError::Config(format!(
                        "base URL '{}' cannot be joined to '{}': {e}",
                        self.base_url, self.host
                    ))
                })?
            }
        };

        if url.cannot_be_a_base() {
            return Err(DashboardError::Config(format!("'{url}' cannot be used as an API base")));
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_proxy() {
        let cfg = Config::default();
        assert_eq!(cfg.base_url, "/api/v1");
        assert_eq!(cfg.username, "user");
        assert_eq!(
            cfg.api_base().unwrap().as_str(),
            "http://localhost:9091/api/v1"
        );
    }

    #[test]
    fn absolute_base_url_ignores_host() {
        let cfg = Config {
            base_url: "https://weather.example.com/v2".into(),
            ..Config::default()
        };
        assert_eq!(
            cfg.api_base().unwrap().as_str(),
            "https://weather.example.com/v2"
        );
    }

    #[test]
    fn override_replaces_base_url_unless_blank() {
        let mut cfg = Config::default();
        cfg.apply_base_url_override(Some("   ".into()));
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);

        cfg.apply_base_url_override(Some("http://10.0.0.5:8080/api/v1".into()));
        assert_eq!(cfg.base_url, "http://10.0.0.5:8080/api/v1");

        cfg.apply_base_url_override(None);
        assert_eq!(cfg.base_url, "http://10.0.0.5:8080/api/v1");
    }

    #[test]
    fn bad_host_is_a_config_error() {
        let cfg = Config {
            host: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(cfg.api_base(), Err(DashboardError::Config(_))));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config {
            username: "ops".into(),
            timeout_secs: 5,
            ..Config::default()
        };
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.username, "ops");
        assert_eq!(loaded.timeout_secs, 5);
        assert_eq!(loaded.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.host, DEFAULT_HOST);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "username = \"analyst\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.username, "analyst");
        assert_eq!(cfg.timeout_secs, 30);
    }
}
