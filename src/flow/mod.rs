//! Flow module
//!
//! Flow graphs, the built-in tenants, the tenant registry and the engine
//! that walks a conversation through a graph.

pub mod definition;
pub mod engine;
pub mod registry;
pub mod tenants;

#[cfg(test)]
mod proptests;

pub use definition::{
    FlowDefinition, FlowOption, FlowStep, InputKind, InputStep, OptionAction, OptionsStep,
    TenantConfig, INITIAL_STATE,
};
pub use engine::{transition, SideEffect, TransitionResult, UserInput};
pub use registry::{FlowRegistry, LoadFailure, LoadReport};
