//! Test data and settings builders

use std::sync::Arc;
use ChatFlow::{
    config::Settings,
    services::MemoryTracker,
    ConversationController, FlowRegistry,
};

/// Settings pointing the tracker at a mock sink, with short retries
pub fn tracking_settings(api_url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.tracking.enabled = true;
    settings.tracking.api_url = api_url.to_string();
    settings.tracking.timeout_seconds = 2;
    settings.tracking.max_retries = 2;
    settings.tracking.retry_backoff_ms = 10;
    settings
        .tracking
        .access_keys
        .insert("The Bot Agency".to_string(), "tba-access-key".to_string());
    settings.conversation.typing_delay_ms = 0;
    settings
}

/// Controller over the built-in tenants recording into a memory tracker
pub fn memory_controller() -> (ConversationController, MemoryTracker) {
    let registry = Arc::new(FlowRegistry::with_builtin_tenants().expect("built-in tenants are valid"));
    let tracker = MemoryTracker::new();
    let controller = ConversationController::new(registry, Arc::new(tracker.clone()), &Settings::default());
    (controller, tracker)
}

pub const ACME_JSON: &str = r#"{
    "brand_name": "Acme Robotics",
    "steps": {
        "INITIAL": { "type": "options", "options": [
            { "text": "Get a quote", "next_state": "ASK_EMAIL", "bot_response": "Where should we send it?", "service": "Quotes" },
            { "text": "Talk to sales", "next_state": "DONE", "bot_response": "Opening the calendar.",
              "action": { "kind": "open_link", "url": "https://acme.example/sales" } }
        ]},
        "ASK_EMAIL": { "type": "input", "input_kind": "email", "next_state": "DONE",
                       "bot_response": "Thanks, a quote is on its way.", "submit_on_completion": true,
                       "validation_message": "We need an email to send the quote." },
        "DONE": { "type": "end" }
    }
}"#;

pub const ACME_TOML: &str = r#"
tenant_id = "acme-support"
brand_name = "Acme Support"

[steps.INITIAL]
type = "options"

[[steps.INITIAL.options]]
text = "Report a problem"
next_state = "DESCRIBE"
bot_response = "Tell us what happened."

[steps.DESCRIBE]
type = "input"
input_kind = "text"
next_state = "DONE"
bot_response = "Thanks, we'll look into it."

[steps.DONE]
type = "end"
"#;

/// A definition whose only option points at a missing state
pub const DANGLING_JSON: &str = r#"{
    "brand_name": "Broken",
    "steps": {
        "INITIAL": { "type": "options", "options": [
            { "text": "Go", "next_state": "NOWHERE", "bot_response": "..." }
        ]}
    }
}"#;
