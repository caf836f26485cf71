//! Conversation state
//!
//! This module holds the per-conversation record the engine advances: the
//! active state name, the collected data and the display transcript.

use std::fmt;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::flow::FlowDefinition;
use crate::utils::helpers::generate_uuid;

/// Who sent a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion-ordered string map of everything the visitor provided
///
/// Re-inserting an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedData {
    entries: Vec<(String, String)>,
}

impl CollectedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, returning the one it replaced
    pub fn insert(&mut self, key: &str, value: &str) -> Option<String> {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value.to_string())),
            None => {
                self.entries.push((key.to_string(), value.to_string()));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CollectedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for CollectedData {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut data = CollectedData::new();
        for (key, value) in iter {
            data.insert(key, value);
        }
        data
    }
}

/// One transcript record
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub content: String,
    /// User messages carry the state they answered, bot messages the state they lead into
    pub at_state: String,
    pub timestamp: DateTime<Utc>,
}

/// Mutable record of one conversation
///
/// Fields are private so the transcript stays append-only and the current
/// state always names a step of the definition the state was started from.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversationState {
    session_id: String,
    current_state: String,
    collected_data: CollectedData,
    history: Vec<HistoryEntry>,
    started_at: DateTime<Utc>,
}

impl ConversationState {
    /// Start a fresh conversation at the definition's entry state
    pub fn new(definition: &FlowDefinition) -> Self {
        Self::with_session_id(definition, &generate_uuid())
    }

    pub fn with_session_id(definition: &FlowDefinition, session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            current_state: definition.entry_state().to_string(),
            collected_data: CollectedData::new(),
            history: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    pub fn collected_data(&self) -> &CollectedData {
        &self.collected_data
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub(crate) fn record(&mut self, sender: Sender, content: &str, at_state: &str) {
        self.history.push(HistoryEntry {
            sender,
            content: content.to_string(),
            at_state: at_state.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub(crate) fn collect(&mut self, key: &str, value: &str) {
        self.collected_data.insert(key, value);
    }

    pub(crate) fn advance_to(&mut self, state: &str) {
        self.current_state = state.to_string();
    }

    /// Summary for logging and debugging
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            session_id: self.session_id.clone(),
            current_state: self.current_state.clone(),
            data_keys: self.collected_data.keys().map(str::to_string).collect(),
            messages: self.history.len(),
            started_at: self.started_at,
        }
    }
}

/// Conversation summary for logging and debugging
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversationSummary {
    pub session_id: String,
    pub current_state: String,
    pub data_keys: Vec<String>,
    pub messages: usize,
    pub started_at: DateTime<Utc>,
}
