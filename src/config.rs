//! Config module - Manages the tool's own settings (newsbot.toml).
//!
//! Not to be confused with the bot's `config.json` (see `document`). This
//! file contains:
//! - GitHub API location and the path of the bot config inside the repo
//! - Where the credential is stored

use crate::credentials::{FileStore, KeyValueStore, KeyringStore, DEFAULT_CREDENTIAL_KEY};
use crate::sync::DEFAULT_COMMIT_MESSAGE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API root (change for GitHub Enterprise)
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Path of the bot config inside the repository
    #[serde(default = "default_file_path")]
    pub file_path: String,
    /// User-Agent header (GitHub rejects requests without one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Commit message prefix for saves
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_file_path() -> String {
    "config.json".to_string()
}

fn default_user_agent() -> String {
    "newsbot-config".to_string()
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            file_path: default_file_path(),
            user_agent: default_user_agent(),
            commit_message: default_commit_message(),
        }
    }
}

/// Where the credential lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// JSON file in the config directory (default)
    #[default]
    File,
    /// OS keychain
    Keyring,
}

/// Credential storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub backend: CredentialBackend,
    /// Storage key of the credential record
    #[serde(default = "default_credential_key")]
    pub key: String,
}

fn default_credential_key() -> String {
    DEFAULT_CREDENTIAL_KEY.to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            backend: CredentialBackend::default(),
            key: default_credential_key(),
        }
    }
}

/// Main settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config version (for future migrations)
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            github: GitHubConfig::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

/// Get default config directory (~/.config/newsbot/).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("newsbot"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get default config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("newsbot.toml")
}

impl AppConfig {
    /// Load config from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Cannot parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from path, falling back to defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Cannot serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Cannot write config file: {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Storage backend for the credential, rooted at `config_dir` for file storage.
    pub fn credential_backend(&self, config_dir: &Path) -> Box<dyn KeyValueStore> {
        match self.credentials.backend {
            CredentialBackend::File => Box::new(FileStore::new(config_dir)),
            CredentialBackend::Keyring => Box::new(KeyringStore::new("newsbot")),
        }
    }
}
