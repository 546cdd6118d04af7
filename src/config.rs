//! Runtime settings for the `feedwatch` binary.
//!
//! [`Settings::load`] layers, lowest priority first: the embedded defaults,
//! an optional TOML file, and `FEEDWATCH_*` environment variables (for
//! example `FEEDWATCH_POLL_INTERVAL_SECS=60`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CONFIG: &str = r#"
feeds_path         = "feeds.json"
poll_interval_secs = 300
fetch_timeout_secs = 30
user_agent         = "feedwatch/0.1"
"#;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "feedwatch.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// JSON file holding the configured sources.
    pub feeds_path: PathBuf,
    /// Pause between two update cycles.
    pub poll_interval_secs: u64,
    /// Per-request timeout for feed downloads.
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feeds_path: PathBuf::from("feeds.json"),
            poll_interval_secs: 300,
            fetch_timeout_secs: 30,
            user_agent: "feedwatch/0.1".to_string(),
        }
    }
}

impl Settings {
    /// Load settings, reading `file` if it exists.
    pub fn load(file: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix("FEEDWATCH"))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
