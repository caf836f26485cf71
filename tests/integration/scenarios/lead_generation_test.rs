//! The Bot Agency lead generation flow, from greeting to booking link

use assert_matches::assert_matches;
use ChatFlow::{
    flow::{InputKind, SideEffect, UserInput},
    services::TrackingEvent,
    state::{Sender, StepPrompt},
    ChatFlowError,
};

use crate::helpers::memory_controller;
use crate::integration::init_test_logging;

#[tokio::test(start_paused = true)]
async fn test_complete_lead_generation_journey() {
    init_test_logging();
    let (mut controller, tracker) = memory_controller();
    let opened = controller.open("thebotagency").unwrap();
    let handle = opened.handle;

    let reply = controller.respond(handle, UserInput::option("💻 Website Development")).await.unwrap();
    assert_eq!(reply.message, "Great choice! What kind of website are you looking for?");
    assert_matches!(reply.prompt, StepPrompt::Options { ref options } if options.len() == 4);

    let reply = controller.respond(handle, UserInput::option("Business")).await.unwrap();
    assert_matches!(reply.prompt, StepPrompt::Input { kind: InputKind::Phone, ref placeholder }
        if placeholder == "Enter your phone number...");

    let reply = controller.respond(handle, UserInput::text("  +91 98765 43210 ")).await.unwrap();
    assert!(reply.side_effects.is_empty());
    assert_matches!(reply.prompt, StepPrompt::Input { kind: InputKind::Email, .. });

    let reply = controller.respond(handle, UserInput::text("lead@example.com")).await.unwrap();
    assert!(reply.message.starts_with("Got it ✅ Our team will reach out shortly."));
    let snapshot = match reply.side_effects.as_slice() {
        [SideEffect::SubmitCollectedData { snapshot }] => snapshot.clone(),
        other => panic!("expected a single checkpoint, got {:?}", other),
    };
    let keys: Vec<&str> = snapshot.keys().collect();
    assert_eq!(keys, vec![
        "INITIAL", "service", "ASK_WEBSITE_TYPE", "COLLECT_PHONE", "phone", "COLLECT_EMAIL", "email",
    ]);
    assert_eq!(snapshot.get("service"), Some("Web Development"));
    assert_eq!(snapshot.get("phone"), Some("+91 98765 43210"));

    controller.respond(handle, UserInput::option("Immediately")).await.unwrap();
    controller.respond(handle, UserInput::option("Under ₹50k")).await.unwrap();

    let reply = controller.respond(handle, UserInput::option("📅 Book Call")).await.unwrap();
    assert!(reply.reached_terminal);
    assert_eq!(reply.links(), vec!["https://calendly.com/harry-thebot/consultation-with-thebot"]);
    assert_eq!(reply.prompt, StepPrompt::Finished);

    let after_end = controller.submit(handle, UserInput::option("📅 Book Call"));
    assert_matches!(after_end, Err(ChatFlowError::FlowExhausted { .. }));

    let state = controller.state(handle).unwrap();
    assert_eq!(state.current_state(), "END");
    assert_eq!(state.history().len(), 14);
    assert_eq!(state.collected_data().get("FINAL_CTA"), Some("📅 Book Call"));

    // session start, a user and bot message per step, one checkpoint
    let events = tracker.events_for(&opened.session_id);
    assert_eq!(events.len(), 16);
    assert_eq!(tracker.checkpoints(), vec![snapshot]);
    assert_matches!(&events[0], TrackingEvent::SessionStart { access_key, .. } if access_key == "public");
}

#[tokio::test(start_paused = true)]
async fn test_tracked_messages_follow_transcript() {
    let (mut controller, tracker) = memory_controller();
    let opened = controller.open("thebotagency").unwrap();

    controller.respond(opened.handle, UserInput::option("🔍 SEO")).await.unwrap();
    controller.respond(opened.handle, UserInput::option("Existing Website")).await.unwrap();

    let history = controller.state(opened.handle).unwrap().history().to_vec();
    let tracked: Vec<(Sender, String, String)> = tracker
        .events_for(&opened.session_id)
        .into_iter()
        .filter_map(|event| match event {
            TrackingEvent::Message { message_type, content, flow_state, .. } => {
                Some((message_type, content, flow_state))
            }
            _ => None,
        })
        .collect();
    let expected: Vec<(Sender, String, String)> = history
        .iter()
        .map(|entry| (entry.sender, entry.content.clone(), entry.at_state.clone()))
        .collect();

    assert_eq!(tracked, expected);
    assert_eq!(tracked[0].2, "INITIAL");
    assert_eq!(tracked[1].2, "ASK_SEO_TYPE");
    assert_eq!(tracked[2].2, "ASK_SEO_TYPE");
    assert_eq!(tracked[3].2, "COLLECT_PHONE");
}

#[tokio::test(start_paused = true)]
async fn test_not_now_finishes_without_link() {
    let (mut controller, _) = memory_controller();
    let handle = controller.open("thebotagency").unwrap().handle;

    for input in [
        UserInput::option("📱 App Development"),
        UserInput::text("555-0100"),
        UserInput::text("me@example.com"),
        UserInput::option("Later"),
        UserInput::option("Above ₹2L"),
    ] {
        controller.respond(handle, input).await.unwrap();
    }

    let reply = controller.respond(handle, UserInput::option("❌ Not Now")).await.unwrap();
    assert!(reply.reached_terminal);
    assert!(reply.links().is_empty());
    assert_eq!(reply.message, "No problem! We'll be in touch soon. Have a great day!");
}
