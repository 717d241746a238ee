use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use artiflow_util::errors::ArtiflowError;
use tracing::debug;

/// Default patterns excluded from collected build environments.
pub const DEFAULT_ENV_EXCLUDE: &str = "*password*;*psw*;*secret*;*key*;*token*;*auth*";

/// Global user configuration loaded from `~/.artiflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

/// Platform connection settings from `[server]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "access-token")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// Build-info collection settings from `[build]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_env_include", rename = "env-include")]
    pub env_include: String,
    #[serde(default = "default_env_exclude", rename = "env-exclude")]
    pub env_exclude: String,
    #[serde(default, rename = "temp-dir")]
    pub temp_dir: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            env_include: default_env_include(),
            env_exclude: default_env_exclude(),
            temp_dir: None,
        }
    }
}

impl BuildConfig {
    /// Directory under which partial build-info is kept.
    pub fn temp_dir(&self) -> PathBuf {
        match &self.temp_dir {
            Some(dir) => expand_home(dir),
            None => dirs_path(),
        }
    }
}

fn default_env_include() -> String {
    "*".to_string()
}

fn default_env_exclude() -> String {
    DEFAULT_ENV_EXCLUDE.to_string()
}

/// Audit settings from `[audit]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default, rename = "min-severity")]
    pub min_severity: Option<String>,
    #[serde(default, rename = "fixable-only")]
    pub fixable_only: bool,
    #[serde(default = "default_poll_interval", rename = "poll-interval-secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_wait", rename = "max-wait-secs")]
    pub max_wait_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            min_severity: None,
            fixable_only: false,
            poll_interval_secs: default_poll_interval(),
            max_wait_secs: default_max_wait(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_wait() -> u64 {
    600
}

impl GlobalConfig {
    /// Load the global configuration from `~/.artiflow/config.toml`, or return
    /// defaults if the file doesn't exist. Environment overrides are applied last.
    pub fn load() -> miette::Result<Self> {
        let path = Self::default_path();
        let mut config = if path.is_file() {
            debug!("Loading config from {}", path.display());
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ArtiflowError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            ArtiflowError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// `ARTIFLOW_URL` and `ARTIFLOW_ACCESS_TOKEN` take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ARTIFLOW_URL") {
            if !url.is_empty() {
                self.server.url = Some(url);
            }
        }
        if let Ok(token) = std::env::var("ARTIFLOW_ACCESS_TOKEN") {
            if !token.is_empty() {
                self.server.access_token = Some(token);
            }
        }
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the artiflow data directory (`~/.artiflow/`).
pub fn dirs_path() -> PathBuf {
    home_dir().join(".artiflow")
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}
