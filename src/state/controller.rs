//! Conversation controller
//!
//! Owns every open conversation, feeds visitor input through the flow
//! engine and reports accepted transitions to the session tracker.
//!
//! A reply is delivered in two phases. `submit` applies the transition and
//! marks the conversation busy; `reveal` hands out the bot response once the
//! typing delay has passed. Input arriving in between is rejected, so the
//! flow can never advance twice for one visible bot message.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::conversation::ConversationState;
use crate::config::{Settings, TrackingConfig};
use crate::flow::definition::{FlowStep, InputKind, TenantConfig};
use crate::flow::engine::{transition, SideEffect, UserInput};
use crate::flow::registry::FlowRegistry;
use crate::services::tracking::SessionTracker;
use crate::utils::errors::{ChatFlowError, Result};
use crate::utils::logging::{log_rejected_input, log_session_event, log_transition};

/// Opaque reference to an open conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationHandle(Uuid);

impl ConversationHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConversationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the renderer should offer the visitor next
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepPrompt {
    Options { options: Vec<String> },
    Input { kind: InputKind, placeholder: String },
    Finished,
}

impl StepPrompt {
    fn for_step(step: Option<&FlowStep>) -> Self {
        match step {
            Some(FlowStep::Options(step)) => StepPrompt::Options {
                options: step.option_texts().into_iter().map(str::to_string).collect(),
            },
            Some(FlowStep::Input(step)) => StepPrompt::Input {
                kind: step.input_kind,
                placeholder: step.input_kind.placeholder().to_string(),
            },
            Some(FlowStep::Terminal) | None => StepPrompt::Finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, StepPrompt::Finished)
    }
}

/// A freshly opened conversation
#[derive(Debug, Clone)]
pub struct OpenedConversation {
    pub handle: ConversationHandle,
    pub session_id: String,
    /// Display-only; not part of the history
    pub greeting: String,
    pub prompt: StepPrompt,
}

/// An accepted transition waiting for its reveal
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub handle: ConversationHandle,
    pub delay: Duration,
    pub side_effects: Vec<SideEffect>,
    pub reached_terminal: bool,
}

/// A revealed bot response
#[derive(Debug, Clone)]
pub struct Reply {
    pub message: String,
    pub side_effects: Vec<SideEffect>,
    pub prompt: StepPrompt,
    pub reached_terminal: bool,
}

impl Reply {
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

#[derive(Debug)]
struct PendingReveal {
    message: String,
    side_effects: Vec<SideEffect>,
    reached_terminal: bool,
}

#[derive(Debug)]
struct Conversation {
    tenant: Arc<TenantConfig>,
    state: ConversationState,
    pending: Option<PendingReveal>,
}

/// Glue between visitors, the flow engine and the tracker
#[derive(Debug)]
pub struct ConversationController {
    registry: Arc<FlowRegistry>,
    tracker: Arc<dyn SessionTracker>,
    tracking: TrackingConfig,
    typing_delay: Duration,
    conversations: HashMap<ConversationHandle, Conversation>,
}

impl ConversationController {
    pub fn new(registry: Arc<FlowRegistry>, tracker: Arc<dyn SessionTracker>, settings: &Settings) -> Self {
        Self {
            registry,
            tracker,
            tracking: settings.tracking.clone(),
            typing_delay: settings.conversation.typing_delay(),
            conversations: HashMap::new(),
        }
    }

    /// Start a conversation for a tenant
    pub fn open(&mut self, tenant_id: &str) -> Result<OpenedConversation> {
        let tenant = self.registry.tenant(tenant_id)?;
        Ok(self.start(tenant))
    }

    /// Discard a conversation and start over with a new handle and session
    pub fn reset(&mut self, handle: ConversationHandle) -> Result<OpenedConversation> {
        let old = self.remove(handle)?;
        log_session_event(old.state.session_id(), &old.tenant.tenant_id, "reset");
        Ok(self.start(old.tenant))
    }

    /// Forget a conversation
    pub fn close(&mut self, handle: ConversationHandle) -> Result<()> {
        let old = self.remove(handle)?;
        log_session_event(old.state.session_id(), &old.tenant.tenant_id, "closed");
        Ok(())
    }

    /// Apply visitor input and mark the conversation busy until `reveal`
    ///
    /// Rejected input leaves the conversation exactly as it was.
    pub fn submit(&mut self, handle: ConversationHandle, input: UserInput) -> Result<PendingReply> {
        let conversation = self.conversation_mut(handle)?;
        if conversation.pending.is_some() {
            return Err(ChatFlowError::ConversationBusy {
                handle: handle.to_string(),
            });
        }

        let from = conversation.state.current_state().to_string();
        let result = match transition(&conversation.tenant.flow, &conversation.state, input) {
            Ok(result) => result,
            Err(err) => {
                log_rejected_input(conversation.state.session_id(), &from, &err.to_string());
                return Err(err);
            }
        };

        let session_id = result.new_state.session_id().to_string();
        log_transition(&session_id, &from, result.new_state.current_state(), result.reached_terminal);

        for entry in result.appended_messages() {
            self.tracker.notify_message(&session_id, entry.sender, &entry.content, &entry.at_state);
        }
        if let Some(snapshot) = result.checkpoint() {
            self.tracker.notify_data_checkpoint(&session_id, snapshot);
        }

        let pending = PendingReply {
            handle,
            delay: self.typing_delay,
            side_effects: result.side_effects.clone(),
            reached_terminal: result.reached_terminal,
        };

        let conversation = self.conversation_mut(handle)?;
        conversation.state = result.new_state;
        conversation.pending = Some(PendingReveal {
            message: result.display_message,
            side_effects: result.side_effects,
            reached_terminal: result.reached_terminal,
        });

        Ok(pending)
    }

    /// Hand out the pending bot response and accept input again
    pub fn reveal(&mut self, handle: ConversationHandle) -> Result<Reply> {
        let conversation = self.conversation_mut(handle)?;
        let pending = conversation.pending.take().ok_or_else(|| ChatFlowError::InvalidTransition {
            state: conversation.state.current_state().to_string(),
            reason: "no bot response is pending".to_string(),
        })?;

        Ok(Reply {
            message: pending.message,
            side_effects: pending.side_effects,
            prompt: StepPrompt::for_step(conversation.tenant.flow.step(conversation.state.current_state())),
            reached_terminal: pending.reached_terminal,
        })
    }

    /// Submit input, wait out the typing delay and reveal the response
    ///
    /// The controller stays mutably borrowed for the whole delay, so no other
    /// conversation can move in the meantime. Front ends serving several
    /// visitors at once should call `submit`, schedule the delay themselves
    /// and `reveal` when it expires.
    pub async fn respond(&mut self, handle: ConversationHandle, input: UserInput) -> Result<Reply> {
        let pending = self.submit(handle, input)?;
        tokio::time::sleep(pending.delay).await;
        self.reveal(handle)
    }

    pub fn state(&self, handle: ConversationHandle) -> Result<&ConversationState> {
        self.conversation(handle).map(|conversation| &conversation.state)
    }

    pub fn tenant(&self, handle: ConversationHandle) -> Result<Arc<TenantConfig>> {
        self.conversation(handle).map(|conversation| conversation.tenant.clone())
    }

    /// Whether a bot response is still being composed
    pub fn is_busy(&self, handle: ConversationHandle) -> Result<bool> {
        self.conversation(handle).map(|conversation| conversation.pending.is_some())
    }

    /// What to render for the current step
    pub fn prompt(&self, handle: ConversationHandle) -> Result<StepPrompt> {
        let conversation = self.conversation(handle)?;
        Ok(StepPrompt::for_step(
            conversation.tenant.flow.step(conversation.state.current_state()),
        ))
    }

    /// Message to show after a blank submission, if the current step takes text
    pub fn re_prompt(&self, handle: ConversationHandle) -> Result<Option<String>> {
        let conversation = self.conversation(handle)?;
        Ok(match conversation.tenant.flow.step(conversation.state.current_state()) {
            Some(FlowStep::Input(step)) => Some(step.re_prompt().to_string()),
            _ => None,
        })
    }

    pub fn active_conversations(&self) -> usize {
        self.conversations.len()
    }

    fn start(&mut self, tenant: Arc<TenantConfig>) -> OpenedConversation {
        let handle = ConversationHandle::new();
        let state = ConversationState::new(&tenant.flow);
        let session_id = state.session_id().to_string();

        self.tracker
            .notify_session_start(&session_id, self.tracking.access_key_for(&tenant.brand_name));
        log_session_event(&session_id, &tenant.tenant_id, "started");

        let opened = OpenedConversation {
            handle,
            session_id,
            greeting: tenant.greeting(),
            prompt: StepPrompt::for_step(tenant.flow.step(state.current_state())),
        };

        self.conversations.insert(handle, Conversation {
            tenant,
            state,
            pending: None,
        });
        debug!(handle = %handle, active = self.conversations.len(), "Conversation opened");
        opened
    }

    fn remove(&mut self, handle: ConversationHandle) -> Result<Conversation> {
        let conversation = self.conversations
            .remove(&handle)
            .ok_or_else(|| ChatFlowError::UnknownConversation(handle.to_string()))?;
        debug!(handle = %handle, summary = ?conversation.state.summary(), "Conversation discarded");
        Ok(conversation)
    }

    fn conversation(&self, handle: ConversationHandle) -> Result<&Conversation> {
        self.conversations
            .get(&handle)
            .ok_or_else(|| ChatFlowError::UnknownConversation(handle.to_string()))
    }

    fn conversation_mut(&mut self, handle: ConversationHandle) -> Result<&mut Conversation> {
        self.conversations
            .get_mut(&handle)
            .ok_or_else(|| ChatFlowError::UnknownConversation(handle.to_string()))
    }
}
