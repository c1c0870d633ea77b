use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::{PolicyLimits, DEFAULT_THRESHOLD};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub redis: Option<RedisSettings>,
    #[serde(default)]
    pub email: Option<EmailSettings>,
    #[serde(default)]
    pub policy: PolicySettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    #[serde(default = "default_email_timeout")]
    pub timeout_secs: u64,
}

fn default_email_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct PolicySettings {
    #[serde(default = "default_interests_per_day")]
    pub interests_per_day: u32,
    #[serde(default = "default_messages_per_hour")]
    pub messages_per_hour: u32,
    #[serde(default = "default_messages_per_day")]
    pub messages_per_day: u32,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            interests_per_day: default_interests_per_day(),
            messages_per_hour: default_messages_per_hour(),
            messages_per_day: default_messages_per_day(),
        }
    }
}

impl From<&PolicySettings> for PolicyLimits {
    fn from(value: &PolicySettings) -> Self {
        PolicyLimits {
            interests_per_day: value.interests_per_day,
            messages_per_hour: value.messages_per_hour,
            messages_per_day: value.messages_per_day,
        }
    }
}

fn default_interests_per_day() -> u32 { 5 }
fn default_messages_per_hour() -> u32 { 50 }
fn default_messages_per_day() -> u32 { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
    /// Candidates fetched from the profile store per discovery request
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_threshold() -> u8 { DEFAULT_THRESHOLD }
fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }
fn default_pool_size() -> usize { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// Per-user buffer of the in-process broadcast sink
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize { 64 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MATCHMAKING__), after `.env`
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MATCHMAKING__POLICY__INTERESTS_PER_DAY -> policy.interests_per_day
            .add_source(
                Environment::with_prefix("MATCHMAKING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_database_url(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MATCHMAKING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn policy_limits(&self) -> PolicyLimits {
        PolicyLimits::from(&self.policy)
    }
}

/// Let the conventional DATABASE_URL win over file configuration
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}
