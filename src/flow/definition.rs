//! Flow definition model
//!
//! A flow is a per-tenant graph of steps keyed by state name. Definitions are
//! validated once when constructed or deserialized, so a `FlowDefinition` that
//! exists is always closed: every `next_state` it mentions is one of its keys.

use std::collections::{BTreeSet, HashMap, VecDeque};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::utils::errors::{DefinitionError, DefinitionResult};

/// Designated entry state of every shipped flow
pub const INITIAL_STATE: &str = "INITIAL";

/// Data key written with an entry option's service tag
pub const SERVICE_KEY: &str = "service";

/// Semantic data keys; state names may not reuse them
pub const RESERVED_DATA_KEYS: [&str; 4] = [SERVICE_KEY, "phone", "email", "text"];

/// Kind of value an input step expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Phone,
    Email,
    #[serde(rename = "text", alias = "free_text")]
    FreeText,
}

impl InputKind {
    /// Well-known collected-data key for this kind
    pub fn data_key(&self) -> &'static str {
        match self {
            InputKind::Phone => "phone",
            InputKind::Email => "email",
            InputKind::FreeText => "text",
        }
    }

    /// Placeholder shown by the input control
    pub fn placeholder(&self) -> &'static str {
        match self {
            InputKind::Phone => "Enter your phone number...",
            InputKind::Email => "Enter your email...",
            InputKind::FreeText => "Enter text...",
        }
    }

    fn default_validation_message(&self) -> &'static str {
        match self {
            InputKind::Phone => "Please enter your phone number.",
            InputKind::Email => "Please enter your email address.",
            InputKind::FreeText => "Please type a response.",
        }
    }
}

/// Side effect attached to an option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptionAction {
    OpenLink { url: String },
}

/// One selectable option of an options step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOption {
    /// Display text, also the identity of the option within its step
    pub text: String,
    pub next_state: String,
    /// Shown verbatim as the next bot message
    pub bot_response: String,
    /// Recorded as `service` only when chosen from the entry state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<OptionAction>,
}

impl FlowOption {
    pub fn new(text: &str, next_state: &str, bot_response: &str) -> Self {
        Self {
            text: text.to_string(),
            next_state: next_state.to_string(),
            bot_response: bot_response.to_string(),
            service: None,
            action: None,
        }
    }

    pub fn with_service(mut self, service: &str) -> Self {
        self.service = Some(service.to_string());
        self
    }

    pub fn with_link(mut self, url: &str) -> Self {
        self.action = Some(OptionAction::OpenLink { url: url.to_string() });
        self
    }
}

/// A menu of options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsStep {
    pub options: Vec<FlowOption>,
}

impl OptionsStep {
    /// Find an option by its display text
    pub fn find(&self, text: &str) -> Option<&FlowOption> {
        self.options.iter().find(|option| option.text == text)
    }

    pub fn option_texts(&self) -> Vec<&str> {
        self.options.iter().map(|option| option.text.as_str()).collect()
    }
}

/// A single free-form input prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStep {
    pub input_kind: InputKind,
    pub bot_response: String,
    pub next_state: String,
    /// Checkpoint: flush the collected data once this step is completed
    #[serde(default)]
    pub submit_on_completion: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_message: Option<String>,
}

impl InputStep {
    pub fn new(input_kind: InputKind, next_state: &str, bot_response: &str) -> Self {
        Self {
            input_kind,
            bot_response: bot_response.to_string(),
            next_state: next_state.to_string(),
            submit_on_completion: false,
            validation_message: None,
        }
    }

    pub fn submit_on_completion(mut self) -> Self {
        self.submit_on_completion = true;
        self
    }

    /// Message used to re-prompt after a blank submission
    pub fn re_prompt(&self) -> &str {
        self.validation_message
            .as_deref()
            .unwrap_or_else(|| self.input_kind.default_validation_message())
    }
}

/// One node of the flow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowStep {
    Options(OptionsStep),
    Input(InputStep),
    #[serde(rename = "end")]
    Terminal,
}

impl FlowStep {
    /// State names this step can transition into
    pub fn next_states(&self) -> Vec<&str> {
        match self {
            FlowStep::Options(step) => step.options.iter().map(|o| o.next_state.as_str()).collect(),
            FlowStep::Input(step) => vec![step.next_state.as_str()],
            FlowStep::Terminal => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStep::Terminal)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FlowStep::Options(_) => "options",
            FlowStep::Input(_) => "input",
            FlowStep::Terminal => "end",
        }
    }
}

/// Serialized shape of a flow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFlowDefinition {
    #[serde(default = "default_entry_state")]
    entry_state: String,
    steps: HashMap<String, FlowStep>,
}

fn default_entry_state() -> String {
    INITIAL_STATE.to_string()
}

/// Validated, immutable flow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFlowDefinition", into = "RawFlowDefinition")]
pub struct FlowDefinition {
    entry_state: String,
    steps: HashMap<String, FlowStep>,
}

impl TryFrom<RawFlowDefinition> for FlowDefinition {
    type Error = DefinitionError;

    fn try_from(raw: RawFlowDefinition) -> DefinitionResult<Self> {
        FlowDefinition::new(&raw.entry_state, raw.steps)
    }
}

impl From<FlowDefinition> for RawFlowDefinition {
    fn from(definition: FlowDefinition) -> Self {
        Self {
            entry_state: definition.entry_state,
            steps: definition.steps,
        }
    }
}

impl FlowDefinition {
    /// Build and validate a flow graph
    pub fn new(entry_state: &str, steps: HashMap<String, FlowStep>) -> DefinitionResult<Self> {
        let definition = Self {
            entry_state: entry_state.to_string(),
            steps,
        };
        definition.validate()?;

        let unreachable = definition.unreachable_states();
        if !unreachable.is_empty() {
            debug!(unreachable = ?unreachable, "Flow definition has unreachable states");
        }

        Ok(definition)
    }

    /// Check graph closure and per-step constraints
    ///
    /// States are checked in name order so the reported error is stable.
    fn validate(&self) -> DefinitionResult<()> {
        if !self.steps.contains_key(&self.entry_state) {
            return Err(DefinitionError::MissingEntryState(self.entry_state.clone()));
        }

        let mut names: Vec<&String> = self.steps.keys().collect();
        names.sort();

        for name in names {
            if RESERVED_DATA_KEYS.contains(&name.as_str()) {
                return Err(DefinitionError::ReservedStateName(name.clone()));
            }

            let step = &self.steps[name];
            if let FlowStep::Options(options_step) = step {
                validate_options(name, options_step)?;
            }

            for next in step.next_states() {
                if !self.steps.contains_key(next) {
                    return Err(DefinitionError::DanglingNextState {
                        from: name.clone(),
                        to: next.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn entry_state(&self) -> &str {
        &self.entry_state
    }

    pub fn step(&self, state: &str) -> Option<&FlowStep> {
        self.steps.get(state)
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.steps.contains_key(state)
    }

    /// All state names in sorted order
    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// States reachable from the entry state, entry included
    pub fn reachable_states(&self) -> BTreeSet<&str> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([self.entry_state.as_str()]);

        while let Some(state) = queue.pop_front() {
            if !seen.insert(state) {
                continue;
            }
            if let Some(step) = self.steps.get(state) {
                queue.extend(step.next_states());
            }
        }

        seen
    }

    fn unreachable_states(&self) -> Vec<&str> {
        let reachable = self.reachable_states();
        self.state_names()
            .into_iter()
            .filter(|name| !reachable.contains(name))
            .collect()
    }
}

fn validate_options(state: &str, step: &OptionsStep) -> DefinitionResult<()> {
    if step.options.is_empty() {
        return Err(DefinitionError::EmptyOptions(state.to_string()));
    }

    let mut texts = BTreeSet::new();
    for option in &step.options {
        if !texts.insert(option.text.as_str()) {
            return Err(DefinitionError::DuplicateOption {
                state: state.to_string(),
                text: option.text.clone(),
            });
        }

        if let Some(OptionAction::OpenLink { url }) = &option.action {
            url::Url::parse(url).map_err(|e| DefinitionError::InvalidLink {
                state: state.to_string(),
                option: option.text.clone(),
                url: url.clone(),
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// A tenant's flow plus the branding it is presented under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantConfig {
    pub tenant_id: String,
    pub brand_name: String,
    pub flow: FlowDefinition,
}

impl TenantConfig {
    pub fn new(tenant_id: &str, brand_name: &str, flow: FlowDefinition) -> DefinitionResult<Self> {
        if tenant_id.trim().is_empty() {
            return Err(DefinitionError::EmptyTenantId);
        }

        Ok(Self {
            tenant_id: tenant_id.to_string(),
            brand_name: brand_name.to_string(),
            flow,
        })
    }

    /// Opening message shown when a conversation starts
    pub fn greeting(&self) -> String {
        format!(
            "Hey 👋 I'm your guide from {}. How can I help you today?",
            self.brand_name
        )
    }
}
