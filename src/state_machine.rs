//! Pricing assistant state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition` maps (state, action) to a new state plus a list of effects,
//! and the runtime is the only place effects are executed.

pub mod action;
mod effect;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use action::{Action, ActionError, ActionRequest};
pub use effect::Effect;
pub use state::{AssistantState, Chip, ContactLink, SessionContext, DEFAULT_EXIT_DELAY};
pub use transition::{respond_to_query, transition, TransitionError, TransitionResult};
