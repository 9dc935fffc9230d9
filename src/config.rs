//! Configuration management for Peerchat
//!
//! This module handles loading, parsing, validating, and merging
//! configuration from a YAML file, environment defaults, and CLI
//! overrides.

use crate::cli::Cli;
use crate::error::{PeerchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for Peerchat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Messaging service settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Local identity settings
    #[serde(default)]
    pub user: UserConfig,
}

/// Messaging service (REST API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the platform API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Identity of the local user
///
/// The platform's session service normally supplies this; for the CLI
/// it comes from the config file or `--user-id`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Current user's id
    #[serde(default)]
    pub id: Option<String>,
}

impl Config {
    /// Load configuration from a YAML file and apply CLI overrides
    ///
    /// A missing file is not an error: defaults are used so that
    /// `--api-url`/`--user-id` alone are enough to run.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use peerchat::cli::Cli;
    /// use peerchat::config::Config;
    ///
    /// let cli = Cli::parse_args();
    /// let config = Config::load("config/config.yaml", &cli).unwrap();
    /// config.validate().unwrap();
    /// ```
    pub fn load(path: impl AsRef<Path>, cli: &Cli) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(PeerchatError::Io)?;
            let parsed: Config = serde_yaml::from_str(&raw).map_err(PeerchatError::Yaml)?;
            tracing::debug!("Loaded configuration from {}", path.display());
            parsed
        } else {
            tracing::debug!(
                "No configuration file at {}; using defaults",
                path.display()
            );
            Config::default()
        };

        if let Some(api_url) = &cli.api_url {
            config.api.base_url = api_url.clone();
        }
        if let Some(user_id) = &cli.user_id {
            config.user.id = Some(user_id.clone());
        }

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `Config` errors for an unparseable base URL or a zero
    /// timeout.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url)
            .map_err(|e| PeerchatError::Config(format!("Invalid api.base_url: {}", e)))?;

        if self.api.timeout_secs == 0 {
            return Err(
                PeerchatError::Config("api.timeout_secs must be at least 1".to_string()).into(),
            );
        }

        Ok(())
    }

    /// The current user id, required for any chat command
    pub fn require_user_id(&self) -> Result<&str> {
        self.user.id.as_deref().ok_or_else(|| {
            PeerchatError::Config(
                "no user id configured; set user.id or pass --user-id".to_string(),
            )
            .into()
        })
    }

    /// Default config file location
    ///
    /// Prefers `config/config.yaml` in the working directory, falling
    /// back to the platform config directory.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from("config/config.yaml");
        if local.exists() {
            return local;
        }
        directories::ProjectDirs::from("io", "peerchat", "peerchat")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .unwrap_or(local)
    }
}
