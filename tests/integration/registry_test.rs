//! Loading tenant flows from a definition directory

use std::sync::Arc;
use assert_matches::assert_matches;
use ChatFlow::{
    config::Settings,
    flow::{FlowRegistry, UserInput},
    services::MemoryTracker,
    utils::errors::DefinitionError,
    ChatFlowError, ConversationController, StepPrompt,
};

use crate::helpers::*;

async fn write_definitions(dir: &std::path::Path) {
    tokio::fs::write(dir.join("acme.json"), ACME_JSON).await.unwrap();
    tokio::fs::write(dir.join("acme.toml"), ACME_TOML).await.unwrap();
    tokio::fs::write(dir.join("broken.json"), DANGLING_JSON).await.unwrap();
    tokio::fs::write(dir.join("garbled.toml"), "steps = [").await.unwrap();
    tokio::fs::write(dir.join("README.txt"), "not a flow").await.unwrap();
}

#[tokio::test]
async fn test_directory_loading_reports_per_file() {
    let dir = tempfile::tempdir().unwrap();
    write_definitions(dir.path()).await;

    let mut registry = FlowRegistry::with_builtin_tenants().unwrap();
    let report = registry.load_directory(dir.path()).await.unwrap();

    assert_eq!(report.loaded, vec!["acme".to_string(), "acme-support".to_string()]);
    assert_eq!(report.failures.len(), 2);
    assert!(!report.is_clean());

    let broken = report
        .failures
        .iter()
        .find(|failure| failure.source.ends_with("broken.json"))
        .unwrap();
    assert_matches!(
        &broken.error,
        ChatFlowError::Definition(DefinitionError::DanglingNextState { to, .. }) if to == "NOWHERE"
    );
    let garbled = report
        .failures
        .iter()
        .find(|failure| failure.source.ends_with("garbled.toml"))
        .unwrap();
    assert_matches!(garbled.error, ChatFlowError::TomlParse(_));

    // the built-in tenants survive the bad files
    assert_eq!(registry.len(), 5);
    assert!(registry.get("thebotagency").is_some());
    assert!(registry.get("broken").is_none());
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = FlowRegistry::new();

    let result = registry.load_directory(&dir.path().join("missing")).await;
    assert_matches!(result, Err(ChatFlowError::Io(_)));
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_loaded_tenant_drives_conversation() {
    let dir = tempfile::tempdir().unwrap();
    write_definitions(dir.path()).await;

    let mut registry = FlowRegistry::new();
    registry.load_directory(dir.path()).await.unwrap();

    let tracker = MemoryTracker::new();
    let mut settings = Settings::default();
    settings.tracking.access_keys.insert("Acme Robotics".to_string(), "acme-key".to_string());
    let mut controller = ConversationController::new(Arc::new(registry), Arc::new(tracker.clone()), &settings);

    let opened = controller.open("acme").unwrap();
    assert_eq!(opened.greeting, "Hey 👋 I'm your guide from Acme Robotics. How can I help you today?");

    controller.respond(opened.handle, UserInput::option("Get a quote")).await.unwrap();
    controller.submit(opened.handle, UserInput::text("")).unwrap_err();
    assert_eq!(
        controller.re_prompt(opened.handle).unwrap().as_deref(),
        Some("We need an email to send the quote.")
    );

    let reply = controller.respond(opened.handle, UserInput::text("buyer@example.com")).await.unwrap();
    assert!(reply.reached_terminal);
    assert_eq!(reply.prompt, StepPrompt::Finished);
    assert_eq!(tracker.checkpoints()[0].get("service"), Some("Quotes"));

    let support = controller.open("acme-support").unwrap();
    controller.respond(support.handle, UserInput::option("Report a problem")).await.unwrap();
    controller.respond(support.handle, UserInput::text("The arm stopped moving")).await.unwrap();
    assert_eq!(
        controller.state(support.handle).unwrap().collected_data().get("text"),
        Some("The arm stopped moving")
    );
    // no checkpoint configured on the support flow
    assert_eq!(tracker.checkpoints().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_loaded_link_option() {
    let dir = tempfile::tempdir().unwrap();
    write_definitions(dir.path()).await;
    let mut registry = FlowRegistry::new();
    registry.load_directory(dir.path()).await.unwrap();

    let (tracker, settings) = (MemoryTracker::new(), Settings::default());
    let mut controller = ConversationController::new(Arc::new(registry), Arc::new(tracker), &settings);
    let handle = controller.open("acme").unwrap().handle;

    let reply = controller.respond(handle, UserInput::option("Talk to sales")).await.unwrap();
    assert_eq!(reply.links(), vec!["https://acme.example/sales"]);
    assert!(reply.reached_terminal);
}
