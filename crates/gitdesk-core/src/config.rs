//! Configuration management for gitdesk.

use std::fs;
use std::path::{Path, PathBuf};

use gitdesk_git::{Facade, GitTool, Identity};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// gitdesk configuration loaded from `<config dir>/gitdesk/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Fallback author identity.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// External tool settings.
    #[serde(default)]
    pub git: GitConfig,

    /// Log filter settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Default location of the configuration file.
    ///
    /// # Errors
    /// Returns [`Error::NoConfigDir`] if the platform has no config directory.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("gitdesk").join("config.toml"))
            .ok_or(Error::NoConfigDir)
    }

    /// Load config from a TOML file. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, or from [`Config::default_path`] when `None`.
    ///
    /// # Errors
    /// Returns error if the file exists but can't be read or parsed.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Ok(path) => Self::load(path),
                Err(Error::NoConfigDir) => Ok(Self::default()),
                Err(e) => Err(e),
            },
        }
    }

    /// Save config to a TOML file, creating parent directories.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// An unbound facade using the configured executable and fallback identity.
    #[must_use]
    pub fn facade(&self) -> Facade {
        let tool = self
            .git
            .executable
            .as_ref()
            .map_or_else(GitTool::default, GitTool::new);
        let mut facade = Facade::with_tool(tool);
        facade.set_fallback_identity(self.identity.to_identity());
        facade
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Remote used when a command omits one.
    #[serde(default = "default_remote")]
    pub default_remote: String,

    /// Default number of commits shown by `log`.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_remote: default_remote(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_remote() -> String {
    "origin".into()
}

const fn default_history_limit() -> usize {
    50
}

/// Identity used for commits when neither the caller nor git config has one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl IdentityConfig {
    /// `None` when neither field is set. A partial identity is completed
    /// from git configuration at commit time.
    #[must_use]
    pub fn to_identity(&self) -> Option<Identity> {
        if self.name.is_none() && self.email.is_none() {
            return None;
        }
        Some(Identity::new(
            self.name.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
        ))
    }
}

/// External tool settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitConfig {
    /// Explicit path to the git executable; looked up on `PATH` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
}

/// Log filter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `gitdesk_git=debug`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}
