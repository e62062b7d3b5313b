pub mod init;
mod schema;

pub use schema::{Config, MailConfig, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scoring::ScoringConfig;

/// Get the config directory path (~/.config/couplefin/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".config").join("couplefin"))
        .unwrap_or_else(|| PathBuf::from(".couplefin"))
}

/// Get the default config file path (~/.config/couplefin/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/couplefin/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
///
/// A missing default config file is not an error: built-in defaults apply.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    parse_config(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_saphyr::from_str(content)?;
    Ok(config)
}

impl Config {
    /// Scoring settings with defaults applied
    pub fn effective_scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }

    pub fn poll_interval(&self) -> Result<Duration> {
        let interval = humantime::parse_duration(self.poll_interval.trim())
            .with_context(|| format!("poll_interval: invalid duration '{}'", self.poll_interval))?;
        if interval.is_zero() {
            anyhow::bail!("poll_interval: must be greater than zero");
        }
        Ok(interval)
    }

    pub fn store_path(&self, data_dir_override: Option<&Path>) -> PathBuf {
        crate::store::get_store_path(data_dir_override.or(self.data_dir.as_deref()))
    }

    /// Collect every configuration problem so they can be reported together
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(scoring_errors) = crate::scoring::validate_scoring(&self.effective_scoring()) {
            errors.extend(scoring_errors);
        }
        if let Err(e) = self.poll_interval() {
            errors.push(format!("{:#}", e));
        }
        if reqwest::Url::parse(&self.base_url).is_err() {
            errors.push(format!("base_url: invalid URL '{}'", self.base_url));
        }
        if self.recent_limit == 0 {
            errors.push("recent_limit: must be at least 1".to_string());
        }
        if let Some(relay) = self.mail.as_ref().and_then(|m| m.relay_url.as_deref()) {
            if reqwest::Url::parse(relay).is_err() {
                errors.push(format!("mail.relay_url: invalid URL '{}'", relay));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
