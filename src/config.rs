//! Configuration file and command-line overrides.
//!
//! Settings live in `{config_dir}/terralens/config.toml`.  A default file is
//! written on first run.  Command-line flags (see [`Overrides`]) win over the
//! file, and the API key falls back to `NASA_API_KEY` and then `DEMO_KEY`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Key NASA hands out for low-volume anonymous use.
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "NASA_API_KEY";

/// Upper bound on the history window; each day is one sequential request.
pub const MAX_HISTORY_DAYS: u32 = 31;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Everything the fetcher needs to talk to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Empty means "not configured"; see [`Config::resolve`].
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Log file location.  Defaults to `{data_dir}/terralens/terralens.log`.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            history_days: default_history_days(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: default_log_file(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.nasa.gov/planetary/apod".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_history_days() -> u32 {
    7
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_filter() -> String {
    "info,terralens=debug,hyper=warn,hyper_util=warn,reqwest=warn".to_string()
}

fn default_log_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("terralens")
        .join("terralens.log")
}

impl EndpointConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check the numeric constraints and the URL.  `max_retries` is unsigned,
    /// so zero (a single attempt) is allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay_ms == 0 {
            return Err(ConfigError::ZeroBaseDelay);
        }
        if self.history_days == 0 {
            return Err(ConfigError::ZeroHistoryDays);
        }
        if self.history_days > MAX_HISTORY_DAYS {
            return Err(ConfigError::TooManyHistoryDays {
                got: self.history_days,
                max: MAX_HISTORY_DAYS,
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::BadUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Values supplied on the command line.  `None` leaves the file's value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub history_days: Option<u32>,
}

impl Config {
    /// Load from the default location, writing defaults if the file is absent.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("terralens")
            .join("config.toml")
    }

    /// Apply command-line overrides and the API key fallback chain, then
    /// validate.  `env_key` is the value of [`API_KEY_ENV`], if set.
    pub fn resolve(
        mut self,
        overrides: Overrides,
        env_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let ep = &mut self.endpoint;
        if let Some(url) = overrides.base_url {
            ep.base_url = url;
        }
        if let Some(n) = overrides.max_retries {
            ep.max_retries = n;
        }
        if let Some(ms) = overrides.base_delay_ms {
            ep.base_delay_ms = ms;
        }
        if let Some(days) = overrides.history_days {
            ep.history_days = days;
        }

        let file_key = Some(std::mem::take(&mut ep.api_key)).filter(|k| !k.trim().is_empty());
        ep.api_key = overrides
            .api_key
            .or(file_key)
            .or(env_key.filter(|k| !k.trim().is_empty()))
            .unwrap_or_else(|| DEMO_API_KEY.to_string());

        ep.validate()?;
        Ok(self)
    }
}
