//! Error handling for ChatFlow
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for ChatFlow
#[derive(Error, Debug)]
pub enum ChatFlowError {
    #[error("Flow definition error: {0}")]
    Definition(#[from] DefinitionError),

    #[error("Invalid transition from {state}: {reason}")]
    InvalidTransition { state: String, reason: String },

    #[error("Empty input submitted at {state}")]
    EmptyInput { state: String },

    #[error("Flow exhausted: {state} is a terminal state")]
    FlowExhausted { state: String },

    #[error("Conversation {handle} is busy composing a response")]
    ConversationBusy { handle: String },

    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("Unknown conversation: {0}")]
    UnknownConversation(String),

    #[error("Tracking failure: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flow graph errors, detected when a tenant definition is loaded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Entry state '{0}' is not defined")]
    MissingEntryState(String),

    #[error("State '{from}' points to undefined state '{to}'")]
    DanglingNextState { from: String, to: String },

    #[error("Options step '{0}' has no options")]
    EmptyOptions(String),

    #[error("Options step '{state}' lists option '{text}' more than once")]
    DuplicateOption { state: String, text: String },

    #[error("Option '{option}' in '{state}' has an invalid link '{url}': {reason}")]
    InvalidLink {
        state: String,
        option: String,
        url: String,
        reason: String,
    },

    #[error("State name '{0}' collides with a reserved data key")]
    ReservedStateName(String),

    #[error("Tenant id must not be empty")]
    EmptyTenantId,
}

/// Tracking sink specific errors
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Tracking request failed: {0}")]
    RequestFailed(String),

    #[error("Tracking request timed out")]
    Timeout,

    #[error("Tracking sink rejected the request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Tracking worker is not running")]
    WorkerStopped,

    #[error("Tracking queue is full ({capacity} events pending)")]
    QueueFull { capacity: usize },
}

impl TrackingError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            TrackingError::RequestFailed(_) => true,
            TrackingError::Timeout => true,
            TrackingError::Rejected { status, .. } => *status >= 500 || *status == 429,
            TrackingError::WorkerStopped => false,
            TrackingError::QueueFull { .. } => false,
        }
    }
}

/// Result type alias for ChatFlow operations
pub type Result<T> = std::result::Result<T, ChatFlowError>;

/// Result type alias for flow definition checks
pub type DefinitionResult<T> = std::result::Result<T, DefinitionError>;

/// Result type alias for tracking operations
pub type TrackingResult<T> = std::result::Result<T, TrackingError>;

impl ChatFlowError {
    /// Check if the error is recoverable
    ///
    /// Recoverable errors leave the conversation where it was; the caller
    /// re-prompts or ignores them.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ChatFlowError::Definition(_) => false,
            ChatFlowError::InvalidTransition { .. } => true,
            ChatFlowError::EmptyInput { .. } => true,
            ChatFlowError::FlowExhausted { .. } => true,
            ChatFlowError::ConversationBusy { .. } => true,
            ChatFlowError::UnknownTenant(_) => false,
            ChatFlowError::UnknownConversation(_) => false,
            ChatFlowError::Tracking(_) => true,
            ChatFlowError::Config(_) => false,
            ChatFlowError::Http(_) => true,
            ChatFlowError::Serialization(_) => false,
            ChatFlowError::TomlParse(_) => false,
            ChatFlowError::UrlParse(_) => false,
            ChatFlowError::Io(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ChatFlowError::Definition(_) => ErrorSeverity::Critical,
            ChatFlowError::Config(_) => ErrorSeverity::Critical,
            ChatFlowError::EmptyInput { .. } => ErrorSeverity::Info,
            ChatFlowError::FlowExhausted { .. } => ErrorSeverity::Info,
            ChatFlowError::ConversationBusy { .. } => ErrorSeverity::Info,
            ChatFlowError::InvalidTransition { .. } => ErrorSeverity::Warning,
            ChatFlowError::Tracking(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
