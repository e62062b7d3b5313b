use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::ScoringConfig;

pub const DEFAULT_BASE_URL: &str = "https://couplefin.app";
pub const DEFAULT_POLL_INTERVAL: &str = "10s";
pub const DEFAULT_RECENT_LIMIT: usize = 3;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Email of the person using this machine
    #[serde(default)]
    pub user: Option<String>,

    /// Origin used to build invite links
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where the store lives (defaults to the config directory)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Alternative question catalog (YAML)
    #[serde(default)]
    pub questions: Option<PathBuf>,

    /// How often `wait` re-checks a session, e.g. "10s", "1m"
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Sessions shown on the dashboard
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,

    #[serde(default)]
    pub mail: Option<MailConfig>,
}

/// Invitation delivery settings. A relay URL wins over the outbox.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// HTTP endpoint accepting {to, subject, text}
    #[serde(default)]
    pub relay_url: Option<String>,

    /// Sender address, also the recipient of `test-mail`
    #[serde(default)]
    pub from: Option<String>,

    /// Directory where messages are written when no relay is configured
    #[serde(default)]
    pub outbox: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval() -> String {
    DEFAULT_POLL_INTERVAL.to_string()
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            base_url: default_base_url(),
            data_dir: None,
            questions: None,
            poll_interval: default_poll_interval(),
            recent_limit: default_recent_limit(),
            scoring: None,
            mail: None,
        }
    }
}
