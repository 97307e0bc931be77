//! Configuration file management for pathly.
//!
//! Provides a TOML-based config file at `~/.config/pathly/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pathly_core::provider::{OpenAiConfig, OpenAiGenerator};
use pathly_core::roadmap::PlanPipeline;
use pathly_db::config::DbConfig;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "PATHLY_MODEL";
pub const PROVIDER_URL_ENV: &str = "PATHLY_PROVIDER_URL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub provider: ProviderSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DbConfig::DEFAULT_URL.to_string(),
        }
    }
}

/// `[provider]`: every key is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProviderSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the pathly config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/pathly` or `~/.config/pathly`,
/// on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("pathly");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("pathly")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// The file may hold an API key, so it is made owner-only (0600) on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PathlyConfig {
    pub db_config: DbConfig,
    /// `None` when no API key is configured; plans are then generated offline.
    pub provider: Option<OpenAiConfig>,
}

/// First non-empty value of the env var `name`.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl PathlyConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `PATHLY_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - API key: `OPENAI_API_KEY` > `provider.api_key` > none (offline)
    /// - Model: `PATHLY_MODEL` > `provider.model` > `gpt-4o`
    /// - Base URL: `PATHLY_PROVIDER_URL` > `provider.base_url` > OpenAI
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        Ok(Self::resolve_with(cli_db_url, load_config().ok()))
    }

    pub fn resolve_with(cli_db_url: Option<&str>, file_config: Option<ConfigFile>) -> Self {
        let file_config = file_config.unwrap_or_default();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Some(url) = env_value(DbConfig::ENV_VAR) {
            url
        } else {
            file_config.database.url.clone()
        };
        let db_config = DbConfig::new(db_url);

        let section = file_config.provider;
        let provider = env_value(API_KEY_ENV).or(section.api_key).map(|key| {
            let mut config = OpenAiConfig::new(key);
            if let Some(model) = env_value(MODEL_ENV).or(section.model) {
                config.model = model;
            }
            if let Some(url) = env_value(PROVIDER_URL_ENV).or(section.base_url) {
                config.base_url = url;
            }
            if let Some(secs) = section.timeout_secs {
                config.timeout = Duration::from_secs(secs);
            }
            config
        });

        Self {
            db_config,
            provider,
        }
    }

    /// Build the generation pipeline. `offline` forces the fallback path
    /// even when a provider is configured.
    pub fn pipeline(&self, offline: bool) -> Result<PlanPipeline> {
        match (&self.provider, offline) {
            (Some(config), false) => {
                let generator = OpenAiGenerator::new(config.clone())
                    .context("failed to set up the text generator")?;
                Ok(PlanPipeline::new(Arc::new(generator)))
            }
            _ => Ok(PlanPipeline::offline()),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
