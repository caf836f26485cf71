//! State management module
//!
//! This module handles conversation state and the controller that owns it

pub mod conversation;
pub mod controller;

// Re-export commonly used state components
pub use conversation::{CollectedData, ConversationState, ConversationSummary, HistoryEntry, Sender};
pub use controller::{ConversationController, ConversationHandle, OpenedConversation, PendingReply, Reply, StepPrompt};
