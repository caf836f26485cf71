//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from configuration files and environment variables.

use std::collections::HashMap;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub tracking: TrackingConfig,
    pub conversation: ConversationConfig,
    pub flows: FlowsConfig,
    pub logging: LoggingConfig,
}

/// Analytics sink configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackingConfig {
    pub enabled: bool,
    pub api_url: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub start_session_path: String,
    pub track_message_path: String,
    pub update_user_data_path: String,
    /// Brand name -> access key; brand names match case-insensitively
    pub access_keys: HashMap<String, String>,
    pub default_access_key: String,
    /// Events waiting for delivery; further events are dropped
    pub queue_capacity: usize,
}

/// Conversation behaviour configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversationConfig {
    pub default_tenant: String,
    /// How long the bot "types" before its response is revealed
    pub typing_delay_ms: u64,
}

/// Flow definition sources
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlowsConfig {
    pub include_builtin: bool,
    pub directory: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files; stderr only when unset
    pub file_path: Option<String>,
}

impl TrackingConfig {
    /// Access key for a tenant brand, falling back to the default key
    ///
    /// The `config` crate lowercases map keys when loading files and the
    /// environment, so brands are compared ignoring case.
    pub fn access_key_for(&self, brand_name: &str) -> &str {
        if let Some(key) = self.access_keys.get(brand_name) {
            return key;
        }

        let brand = brand_name.to_lowercase();
        self.access_keys
            .iter()
            .find(|(name, _)| name.to_lowercase() == brand)
            .map(|(_, key)| key.as_str())
            .unwrap_or(&self.default_access_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl ConversationConfig {
    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }
}

impl Settings {
    /// Load settings from defaults, an optional `config` file and environment variables
    ///
    /// Nested keys use a double underscore, e.g. `CHATFLOW_TRACKING__API_URL`.
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load("config")
    }

    /// Load settings layering the given file (format from its extension, optional) and the environment
    pub fn load(config_file: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name(config_file).required(false))
            .add_source(
                config::Environment::with_prefix("CHATFLOW")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::ChatFlowError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig {
                enabled: false,
                api_url: "http://localhost:8000/api".to_string(),
                timeout_seconds: 10,
                max_retries: 2,
                retry_backoff_ms: 250,
                start_session_path: "/start-session".to_string(),
                track_message_path: "/track-message".to_string(),
                update_user_data_path: "/update-user-data".to_string(),
                access_keys: HashMap::new(),
                default_access_key: "public".to_string(),
                queue_capacity: 1024,
            },
            conversation: ConversationConfig {
                default_tenant: "thebotagency".to_string(),
                typing_delay_ms: 800,
            },
            flows: FlowsConfig {
                include_builtin: true,
                directory: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
        }
    }
}
