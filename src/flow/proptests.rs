//! Property-based tests for the flow engine
//!
//! Random walks over the built-in tenants check that every accepted input
//! grows the transcript by exactly two records and that input is only
//! rejected for the reasons the step shape allows.

use proptest::prelude::*;

use super::definition::FlowStep;
use super::engine::{transition, UserInput};
use super::tenants::builtin_tenants;
use crate::state::conversation::{ConversationState, Sender};
use crate::utils::errors::ChatFlowError;

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Move {
    Pick(usize),
    Type(String),
    Blank(String),
    /// Input of the wrong shape for whatever step we are on
    Mismatch,
}

fn arb_move() -> impl Strategy<Value = Move> {
    prop_oneof![
        4 => any::<usize>().prop_map(Move::Pick),
        3 => "[a-zA-Z0-9@.+ ]{1,30}".prop_filter("needs a visible char", |s| !s.trim().is_empty())
            .prop_map(Move::Type),
        1 => "[ \t\n]{0,5}".prop_map(Move::Blank),
        1 => Just(Move::Mismatch),
    ]
}

fn input_for(step: &FlowStep, mv: &Move) -> UserInput {
    match (step, mv) {
        (FlowStep::Terminal, _) => UserInput::option("anything"),
        (FlowStep::Options(options), Move::Pick(index)) => {
            UserInput::option(&options.options[index % options.options.len()].text)
        }
        (FlowStep::Options(_), Move::Mismatch) => UserInput::text("not an option"),
        (FlowStep::Input(_), Move::Mismatch) => UserInput::option("not a text step"),
        (FlowStep::Options(options), _) => UserInput::option(&options.options[0].text),
        (_, Move::Blank(blank)) => UserInput::text(blank),
        (_, Move::Type(text)) => UserInput::text(text),
        (_, Move::Pick(_)) => UserInput::text("answer"),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn random_walks_keep_invariants(tenant_index in 0usize..3, moves in prop::collection::vec(arb_move(), 1..30)) {
        let tenant = builtin_tenants().unwrap().swap_remove(tenant_index);
        let flow = &tenant.flow;
        let mut state = ConversationState::new(flow);

        for mv in &moves {
            let step = flow.step(state.current_state()).unwrap();
            let input = input_for(step, mv);

            match transition(flow, &state, input.clone()) {
                Ok(result) => {
                    let new_state = &result.new_state;
                    prop_assert!(flow.contains_state(new_state.current_state()));
                    prop_assert_eq!(new_state.history().len(), state.history().len() + 2);

                    let appended = result.appended_messages();
                    prop_assert_eq!(appended[0].sender, Sender::User);
                    prop_assert_eq!(appended[0].at_state.as_str(), state.current_state());
                    prop_assert_eq!(appended[1].sender, Sender::Bot);
                    prop_assert_eq!(appended[1].at_state.as_str(), new_state.current_state());

                    // the answered state is always recorded under its own name
                    prop_assert_eq!(
                        new_state.collected_data().get(state.current_state()),
                        Some(appended[0].content.as_str())
                    );

                    let expects_checkpoint = matches!(step, FlowStep::Input(s) if s.submit_on_completion);
                    prop_assert_eq!(result.checkpoint().is_some(), expects_checkpoint);

                    state = result.new_state;
                }
                Err(err) => {
                    match (&err, step, &input) {
                        (ChatFlowError::FlowExhausted { .. }, FlowStep::Terminal, _) => {}
                        (ChatFlowError::EmptyInput { .. }, FlowStep::Input(_), UserInput::TextSubmitted(text)) => {
                            prop_assert!(text.trim().is_empty());
                        }
                        (ChatFlowError::InvalidTransition { .. }, _, _) => {
                            prop_assert!(matches!(mv, Move::Mismatch));
                        }
                        _ => prop_assert!(false, "unexpected error {:?} at {}", err, state.current_state()),
                    }
                }
            }
        }
    }

    #[test]
    fn blank_input_is_rejected_then_retry_succeeds(blank in "[ \t\n]{0,8}") {
        let tenant = builtin_tenants().unwrap().swap_remove(0);
        let flow = &tenant.flow;
        let start = ConversationState::new(flow);
        let at_phone = transition(flow, &start, UserInput::option("🎯 Branding")).unwrap().new_state;

        let err = transition(flow, &at_phone, UserInput::text(&blank)).unwrap_err();
        prop_assert!(matches!(err, ChatFlowError::EmptyInput { .. }), "expected EmptyInput, got {:?}", err);

        // the visitor stays on the step and can resubmit
        let retried = transition(flow, &at_phone, UserInput::text(&format!("{}+1 555 0100", blank))).unwrap();
        prop_assert_eq!(retried.new_state.collected_data().get("phone"), Some("+1 555 0100"));
        prop_assert_eq!(retried.new_state.history().len(), at_phone.history().len() + 2);
    }
}
