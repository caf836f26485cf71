//! Flow execution engine
//!
//! `transition` is pure: it reads the definition and the current state and
//! returns a new state together with the message to display and the side
//! effects the caller has to perform. A rejected input returns an error and
//! leaves the caller's state untouched.

use crate::state::conversation::{CollectedData, ConversationState, HistoryEntry, Sender};
use crate::utils::errors::{ChatFlowError, Result};
use crate::utils::helpers::is_blank;
use super::definition::{FlowDefinition, FlowStep, OptionAction, SERVICE_KEY};

/// Input from the visitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Display text of the chosen option
    OptionChosen(String),
    TextSubmitted(String),
}

impl UserInput {
    pub fn option(text: &str) -> Self {
        UserInput::OptionChosen(text.to_string())
    }

    pub fn text(value: &str) -> Self {
        UserInput::TextSubmitted(value.to_string())
    }

    fn kind_name(&self) -> &'static str {
        match self {
            UserInput::OptionChosen(_) => "option",
            UserInput::TextSubmitted(_) => "text",
        }
    }
}

/// Deferred instruction for a collaborator; the engine performs no I/O
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// The renderer should navigate to this URL
    OpenLink { url: String },
    /// The collected record must be flushed to the external system
    SubmitCollectedData { snapshot: CollectedData },
}

/// Outcome of an accepted transition
#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub display_message: String,
    pub side_effects: Vec<SideEffect>,
    pub reached_terminal: bool,
}

impl TransitionResult {
    /// The user and bot records this transition appended
    pub fn appended_messages(&self) -> &[HistoryEntry] {
        let history = self.new_state.history();
        &history[history.len().saturating_sub(2)..]
    }

    pub fn checkpoint(&self) -> Option<&CollectedData> {
        self.side_effects.iter().find_map(|effect| match effect {
            SideEffect::SubmitCollectedData { snapshot } => Some(snapshot),
            _ => None,
        })
    }

    pub fn links(&self) -> Vec<&str> {
        self.side_effects
            .iter()
            .filter_map(|effect| match effect {
                SideEffect::OpenLink { url } => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// What an accepted input resolved to, before it is applied
struct Accepted<'a> {
    answer: String,
    next_state: &'a str,
    bot_response: &'a str,
    semantic: Option<(&'static str, String)>,
    link: Option<&'a str>,
    checkpoint: bool,
}

/// Apply one visitor input to a conversation
pub fn transition(
    definition: &FlowDefinition,
    state: &ConversationState,
    input: UserInput,
) -> Result<TransitionResult> {
    let current = state.current_state();
    let step = definition.step(current).ok_or_else(|| ChatFlowError::InvalidTransition {
        state: current.to_string(),
        reason: "state is not part of this flow".to_string(),
    })?;

    let accepted = resolve(definition, current, step, &input)?;

    let mut new_state = state.clone();
    new_state.record(Sender::User, &accepted.answer, current);
    new_state.collect(current, &accepted.answer);
    if let Some((key, value)) = &accepted.semantic {
        new_state.collect(key, value);
    }
    new_state.record(Sender::Bot, accepted.bot_response, accepted.next_state);
    new_state.advance_to(accepted.next_state);

    let mut side_effects = Vec::new();
    if let Some(url) = accepted.link {
        side_effects.push(SideEffect::OpenLink { url: url.to_string() });
    }
    if accepted.checkpoint {
        side_effects.push(SideEffect::SubmitCollectedData {
            snapshot: new_state.collected_data().clone(),
        });
    }

    let reached_terminal = definition
        .step(accepted.next_state)
        .map_or(false, FlowStep::is_terminal);

    Ok(TransitionResult {
        new_state,
        display_message: accepted.bot_response.to_string(),
        side_effects,
        reached_terminal,
    })
}

fn resolve<'a>(
    definition: &'a FlowDefinition,
    current: &str,
    step: &'a FlowStep,
    input: &UserInput,
) -> Result<Accepted<'a>> {
    match (step, input) {
        (FlowStep::Terminal, _) => Err(ChatFlowError::FlowExhausted {
            state: current.to_string(),
        }),
        (FlowStep::Options(options), UserInput::OptionChosen(text)) => {
            let option = options.find(text).ok_or_else(|| ChatFlowError::InvalidTransition {
                state: current.to_string(),
                reason: format!("'{}' is not an option of this step", text),
            })?;

            let semantic = if current == definition.entry_state() {
                option.service.as_ref().map(|service| (SERVICE_KEY, service.clone()))
            } else {
                None
            };

            Ok(Accepted {
                answer: option.text.clone(),
                next_state: &option.next_state,
                bot_response: &option.bot_response,
                semantic,
                link: option.action.as_ref().map(|action| match action {
                    OptionAction::OpenLink { url } => url.as_str(),
                }),
                checkpoint: false,
            })
        }
        (FlowStep::Input(input_step), UserInput::TextSubmitted(value)) => {
            if is_blank(value) {
                return Err(ChatFlowError::EmptyInput {
                    state: current.to_string(),
                });
            }
            let value = value.trim();

            Ok(Accepted {
                answer: value.to_string(),
                next_state: &input_step.next_state,
                bot_response: &input_step.bot_response,
                semantic: Some((input_step.input_kind.data_key(), value.to_string())),
                link: None,
                checkpoint: input_step.submit_on_completion,
            })
        }
        (step, input) => Err(ChatFlowError::InvalidTransition {
            state: current.to_string(),
            reason: format!(
                "{} input does not apply to a {} step",
                input.kind_name(),
                step.kind_name()
            ),
        }),
    }
}
