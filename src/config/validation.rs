//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{ChatFlowError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_tracking_config(&settings.tracking)?;
    validate_conversation_config(&settings.conversation)?;
    validate_flows_config(&settings.flows)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate tracking configuration
fn validate_tracking_config(config: &super::TrackingConfig) -> Result<()> {
    if config.timeout_seconds == 0 {
        return Err(ChatFlowError::Config(
            "Tracking timeout must be greater than 0".to_string()
        ));
    }

    if config.queue_capacity == 0 {
        return Err(ChatFlowError::Config(
            "Tracking queue capacity must be greater than 0".to_string()
        ));
    }

    if config.default_access_key.is_empty() {
        return Err(ChatFlowError::Config(
            "Default access key is required".to_string()
        ));
    }

    if config.enabled {
        if config.api_url.is_empty() {
            return Err(ChatFlowError::Config(
                "Tracking API URL is required when tracking is enabled".to_string()
            ));
        }

        url::Url::parse(&config.api_url).map_err(|e| {
            ChatFlowError::Config(format!("Invalid tracking API URL '{}': {}", config.api_url, e))
        })?;
    }

    Ok(())
}

/// Validate conversation configuration
fn validate_conversation_config(config: &super::ConversationConfig) -> Result<()> {
    if config.default_tenant.is_empty() {
        return Err(ChatFlowError::Config(
            "Default tenant is required".to_string()
        ));
    }

    Ok(())
}

/// Validate flow source configuration
fn validate_flows_config(config: &super::FlowsConfig) -> Result<()> {
    if !config.include_builtin && config.directory.is_none() {
        return Err(ChatFlowError::Config(
            "No flow source configured: enable builtin flows or set a flow directory".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(ChatFlowError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(ChatFlowError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
