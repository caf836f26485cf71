//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the ChatFlow application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{ChatFlowError, Result};

/// Initialize logging based on configuration
///
/// Logs go to stderr so they never interleave with the conversation on stdout.
/// The returned guard must be held for as long as file logging should flush.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| ChatFlowError::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let (file_layer, guard) = match &config.file_path {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "chatflow.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // one JSON object per line in the file
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| ChatFlowError::Config(format!("Failed to install logger: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log an accepted transition
pub fn log_transition(session_id: &str, from: &str, to: &str, reached_terminal: bool) {
    info!(
        session_id = session_id,
        from = from,
        to = to,
        reached_terminal = reached_terminal,
        "Conversation advanced"
    );
}

/// Log a rejected input that left the conversation untouched
pub fn log_rejected_input(session_id: &str, state: &str, reason: &str) {
    debug!(
        session_id = session_id,
        state = state,
        reason = reason,
        "Input rejected"
    );
}

/// Log session lifecycle events
pub fn log_session_event(session_id: &str, tenant_id: &str, event: &str) {
    info!(
        session_id = session_id,
        tenant_id = tenant_id,
        event = event,
        "Session event"
    );
}

/// Log a swallowed tracking failure
pub fn log_tracking_failure(endpoint: &str, session_id: &str, attempts: u32, error: &str) {
    warn!(
        endpoint = endpoint,
        session_id = session_id,
        attempts = attempts,
        error = error,
        "Tracking call dropped"
    );
}

/// Log a tenant definition that failed to load
pub fn log_definition_error(source: &str, error: &str) {
    error!(
        source = source,
        error = error,
        "Flow definition rejected"
    );
}
