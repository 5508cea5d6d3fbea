use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::job_client::PollSchedule;
use crate::retry::RetryPolicy;

/// Environment variable holding the Telegram bot token
pub const ENV_BOT_TOKEN: &str = "TG_BOT_TOKEN";
/// Environment variable holding the rendering API base URL
pub const ENV_RENDER_API_BASE: &str = "SORA_API_BASE";
/// Environment variable holding the rendering API key
pub const ENV_RENDER_API_KEY: &str = "SORA_API_KEY";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "PROMOBOT_LOG_LEVEL";

/// Application configuration module
/// This module handles loading the optional JSON configuration file, layering
/// the environment on top of it and validating the result.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Chat transport settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Rendering service settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Wait-for-completion schedule
    #[serde(default)]
    pub polling: PollSchedule,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Telegram Bot API settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TelegramConfig {
    // @field: Bot credential, usually supplied through TG_BOT_TOKEN
    #[serde(default)]
    pub bot_token: String,

    // @field: Bot API base URL
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    // @field: Long-poll timeout of getUpdates in seconds
    #[serde(default = "default_long_poll_timeout_secs")]
    pub long_poll_timeout_secs: u64,

    // @field: Discard updates queued while the bot was offline
    #[serde(default = "default_true")]
    pub drop_pending_updates: bool,

    // @field: Plain-text token that starts a run
    #[serde(default = "default_run_trigger")]
    pub run_trigger: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_telegram_api_base(),
            long_poll_timeout_secs: default_long_poll_timeout_secs(),
            drop_pending_updates: true,
            run_trigger: default_run_trigger(),
        }
    }
}

/// Rendering service settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderConfig {
    // @field: Base URL, usually supplied through SORA_API_BASE
    #[serde(default)]
    pub api_base: String,

    // @field: Bearer credential, usually supplied through SORA_API_KEY
    #[serde(default)]
    pub api_key: String,

    // @field: Submission endpoint path
    #[serde(default = "default_submit_path")]
    pub submit_path: String,

    // @field: Status endpoint path prefix; the job id is appended
    #[serde(default = "default_status_path")]
    pub status_path: String,

    // @field: Submission request timeout in seconds
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,

    // @field: Status request timeout in seconds
    #[serde(default = "default_status_timeout_secs")]
    pub status_timeout_secs: u64,

    // @field: Retry policy around job submission
    #[serde(default = "RetryPolicy::submission")]
    pub submit_retry: RetryPolicy,

    // @field: Retry policy around each status check
    #[serde(default = "RetryPolicy::status_check")]
    pub status_retry: RetryPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            submit_path: default_submit_path(),
            status_path: default_status_path(),
            submit_timeout_secs: default_submit_timeout_secs(),
            status_timeout_secs: default_status_timeout_secs(),
            submit_retry: RetryPolicy::submission(),
            status_retry: RetryPolicy::status_check(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_long_poll_timeout_secs() -> u64 {
    30
}

fn default_run_trigger() -> String {
    "/go".to_string()
}

fn default_submit_path() -> String {
    "/v2/videos".to_string()
}

fn default_status_path() -> String {
    "/v2/jobs".to_string()
}

fn default_submit_timeout_secs() -> u64 {
    30
}

fn default_status_timeout_secs() -> u64 {
    20
}

impl Config {
    /// Load the JSON configuration file, or defaults if it does not exist
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file not found at '{}', using defaults.", path.display());
            return Ok(Self::default());
        }

        let file = File::open(path)
            .context(format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the file, layer the process environment on top and validate
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override values with whatever `lookup` returns for the known variables.
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(token) = get(ENV_BOT_TOKEN) {
            self.telegram.bot_token = token;
        }
        if let Some(base) = get(ENV_RENDER_API_BASE) {
            self.render.api_base = base;
        }
        if let Some(key) = get(ENV_RENDER_API_KEY) {
            self.render.api_key = key;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            match level.parse() {
                Ok(level) => self.log_level = level,
                Err(e) => warn!("Ignoring {}: {}", ENV_LOG_LEVEL, e),
            }
        }
    }

    /// Names of the required variables that are still empty
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            (ENV_BOT_TOKEN, &self.telegram.bot_token),
            (ENV_RENDER_API_BASE, &self.render.api_base),
            (ENV_RENDER_API_KEY, &self.render.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(anyhow!("Missing required env vars: {}", missing.join(", ")));
        }

        url::Url::parse(&self.render.api_base)
            .context(format!("{} is not a valid URL: {}", ENV_RENDER_API_BASE, self.render.api_base))?;
        url::Url::parse(&self.telegram.api_base)
            .context(format!("Telegram API base is not a valid URL: {}", self.telegram.api_base))?;

        if self.telegram.run_trigger.trim().is_empty() {
            return Err(anyhow!("Run trigger must not be empty"));
        }
        if self.polling.hard_timeout_secs == 0 {
            return Err(anyhow!("Polling hard timeout must be greater than zero"));
        }
        if self.polling.initial_interval_ms == 0 {
            return Err(anyhow!("Polling interval must be greater than zero"));
        }
        if self.polling.multiplier < 1.0 {
            return Err(anyhow!("Polling multiplier must be at least 1.0"));
        }

        Ok(())
    }

    /// Human readable summary with credentials redacted
    pub fn redacted_summary(&self) -> String {
        format!(
            "telegram: api_base={}, bot_token={}, run_trigger={}\n\
             render: api_base={}, api_key={}, submit={}, status={}/<job_id>\n\
             polling: every {}ms x{} up to {}ms, hard timeout {}s\n\
             log_level: {:?}",
            self.telegram.api_base,
            redact(&self.telegram.bot_token),
            self.telegram.run_trigger,
            self.render.api_base,
            redact(&self.render.api_key),
            self.render.submit_path,
            self.render.status_path,
            self.polling.initial_interval_ms,
            self.polling.multiplier,
            self.polling.max_interval_ms,
            self.polling.hard_timeout_secs,
            self.log_level,
        )
    }
}

fn redact(secret: &str) -> String {
    if secret.is_empty() {
        "<unset>".to_string()
    } else {
        format!("<set, {} chars>", secret.chars().count())
    }
}
