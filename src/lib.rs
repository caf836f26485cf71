//! ChatFlow
//!
//! A multi-tenant, scripted chat flow engine. Each tenant ships a flow graph
//! of option and input steps; conversations walk the graph one visitor input
//! at a time while every accepted transition is mirrored to an external
//! analytics sink.

#![allow(non_snake_case)]

pub mod config;
pub mod flow;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{ChatFlowError, Result};

// Re-export main components for easy access
pub use flow::{transition, FlowRegistry, UserInput};
pub use services::{SessionTracker, TrackerService};
pub use state::{ConversationController, ConversationHandle, StepPrompt};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
