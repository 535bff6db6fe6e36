mod defaults;


use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::VigiaError;
use defaults::*;

/// Top-level Vigía configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub vigia: VigiaConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub license: LicenseConfig,
    #[serde(default)]
    pub confirm: ConfirmConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// Clients pre-registered at startup (chat id + watched folder).
    #[serde(default)]
    pub clients: Vec<ClientSeed>,
}

/// General agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VigiaConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for rotated log files. Empty = stdout only.
    #[serde(default)]
    pub log_dir: String,
}

impl Default for VigiaConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub telegram: Option<TelegramConfig>,
}

/// Telegram bot config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
}

/// Storage listing backend config (Drive-style REST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: String,
    /// Folder watched for clients provisioned on first contact.
    #[serde(default)]
    pub default_folder_id: String,
    #[serde(default = "default_storage_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_storage_base_url(),
            access_token: String::new(),
            default_folder_id: String::new(),
            timeout_secs: default_storage_timeout_secs(),
        }
    }
}

/// Processing agent config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// Upper bound on a single execution, in seconds.
    #[serde(default = "default_agent_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            timeout_secs: default_agent_timeout_secs(),
        }
    }
}

/// Folder watcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Sleep after a transport/listing error before the next tick.
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval_secs(),
            error_backoff_secs: default_error_backoff_secs(),
        }
    }
}

/// Subscription/licensing config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Trial length granted to a client on first contact, in days.
    #[serde(default = "default_trial_days")]
    pub trial_days: u64,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
        }
    }
}

/// Confirmation token sets, matched case-insensitively against a trimmed
/// inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmConfig {
    #[serde(default = "default_affirmative_tokens")]
    pub affirmative_tokens: Vec<String>,
    #[serde(default = "default_negative_tokens")]
    pub negative_tokens: Vec<String>,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            affirmative_tokens: default_affirmative_tokens(),
            negative_tokens: default_negative_tokens(),
        }
    }
}

/// Persistence config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// HTTP API configuration — payment-provider callbacks and health checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Bearer token for API authentication. Empty = no auth (local-only use).
    #[serde(default)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_api_host(),
            port: default_api_port(),
            api_key: String::new(),
        }
    }
}

/// A client registered from config at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSeed {
    pub chat_id: String,
    pub folder_id: String,
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Resolve a `${VAR}` reference against the environment.
///
/// Anything that is not a whole-value reference passes through untouched; an
/// unset variable resolves to an empty string so the availability checks
/// downstream report the missing secret instead of using `${VAR}` literally.
fn expand_env(value: &str) -> String {
    let Some(name) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) else {
        return value.to_string();
    };
    match std::env::var(name) {
        Ok(resolved) => resolved,
        Err(_) => {
            tracing::warn!("config: environment variable {name} is not set");
            String::new()
        }
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, VigiaError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| VigiaError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let mut config: Config = toml::from_str(&content)
        .map_err(|e| VigiaError::Config(format!("failed to parse config: {}", e)))?;

    // Secrets may be `${VAR}` references so tokens stay out of the file.
    if let Some(tg) = config.channel.telegram.as_mut() {
        tg.bot_token = expand_env(&tg.bot_token);
    }
    config.storage.access_token = expand_env(&config.storage.access_token);
    config.agent.api_key = expand_env(&config.agent.api_key);
    config.api.api_key = expand_env(&config.api.api_key);

    Ok(config)
}
