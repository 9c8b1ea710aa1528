//! Single-session engine: state, log and generation bookkeeping
//!
//! `Session` applies transitions and the immediate part of their effects. Any
//! delayed work is handed back as `PendingWork` tagged with the generation
//! that produced it; the runtime owns the timers and feeds the work back
//! through `deliver` / `clear_log`, which drop anything from an older
//! generation.

use crate::message::{Message, MessageDraft};
use crate::recommend::UserContext;
use crate::state_machine::{
    respond_to_query, transition, Action, AssistantState, Chip, ContactLink, Effect,
    SessionContext, TransitionError, TransitionResult,
};
use serde::Serialize;
use std::time::Duration;

/// Input from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Action(Action),
    Text(String),
}

/// Immutable view of a session for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: AssistantState,
    pub user_context: UserContext,
    pub chips: Vec<Chip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactLink>,
    pub messages: Vec<Message>,
}

/// Delayed work produced by one input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingWork {
    pub generation: u64,
    /// Messages to append, in order, with delays from the input's arrival
    pub messages: Vec<(Duration, MessageDraft)>,
    /// Clear the log after this delay
    pub clear_after: Option<Duration>,
}

impl PendingWork {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.clear_after.is_none()
    }
}

/// What applying one input changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    pub previous_state: AssistantState,
    pub state_changed: bool,
    /// The log was cleared before any message below was appended
    pub log_cleared: bool,
    /// Pending work of earlier generations is now stale
    pub generation_bumped: bool,
    pub appended: Vec<Message>,
    pub pending: PendingWork,
}

pub struct Session {
    id: String,
    context: SessionContext,
    state: AssistantState,
    messages: Vec<Message>,
    generation: u64,
    /// Delayed messages of the current generation not yet delivered
    awaiting: usize,
    /// A comparison was given since entering `ComparePlans`
    compared: bool,
}

impl Session {
    pub fn new(id: impl Into<String>, context: SessionContext) -> Self {
        Self {
            id: id.into(),
            context,
            state: AssistantState::Idle,
            messages: Vec::new(),
            generation: 0,
            awaiting: 0,
            compared: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &AssistantState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn user_context(&self) -> UserContext {
        self.state.user_context()
    }

    /// Chips for the current state. The guided next step after a comparison
    /// waits until the comparison's replies are all in the log.
    pub fn chips(&self) -> Vec<Chip> {
        let comparison_shown = self.compared && self.awaiting == 0;
        self.state.chips(&self.context.catalog, comparison_shown)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            state: self.state,
            user_context: self.user_context(),
            chips: self.chips(),
            contact: self.state.contact(),
            messages: self.messages().to_vec(),
        }
    }

    /// Apply one input. Out-of-state inputs return the transition error and
    /// leave the session untouched.
    pub fn handle(&mut self, input: Input) -> Result<Applied, TransitionError> {
        let compares = matches!(&input, Input::Action(action) if action.is_comparison());
        let result = match input {
            Input::Action(action) => transition(&self.state, &self.context, action)?,
            Input::Text(text) => {
                let query = respond_to_query(&self.state, &self.context, &text)?;
                tracing::debug!(
                    session_id = %self.id,
                    intent = ?query.intent.intent,
                    confidence = query.intent.confidence,
                    "Resolved typed query"
                );
                query.result
            }
        };
        let applied = self.apply(result);
        if self.state != AssistantState::ComparePlans {
            self.compared = false;
        } else if compares {
            self.compared = true;
        }
        Ok(applied)
    }

    fn apply(&mut self, result: TransitionResult) -> Applied {
        let previous_state = std::mem::replace(&mut self.state, result.new_state);
        let mut applied = Applied {
            previous_state,
            state_changed: previous_state != self.state,
            ..Applied::default()
        };

        for effect in result.effects {
            match effect {
                Effect::StartSession => {
                    self.bump_generation();
                    self.messages.clear();
                    applied.log_cleared = true;
                    applied.generation_bumped = true;
                    applied.pending = PendingWork::default();
                }
                Effect::EndSession { clear_after } => {
                    self.bump_generation();
                    applied.generation_bumped = true;
                    applied.pending = PendingWork::default();
                    if clear_after.is_zero() {
                        self.messages.clear();
                        applied.log_cleared = true;
                    } else {
                        applied.pending.clear_after = Some(clear_after);
                    }
                }
                Effect::AppendMessage { draft, delay } => {
                    // Anything queued behind a delayed message waits its turn
                    if delay.is_zero() && applied.pending.messages.is_empty() {
                        let message = Message::from_draft(draft, delay);
                        self.messages.push(message.clone());
                        applied.appended.push(message);
                    } else {
                        applied.pending.messages.push((delay, draft));
                    }
                }
                Effect::PublishState => {}
            }
        }

        applied.pending.generation = self.generation;
        self.awaiting += applied.pending.messages.len();
        applied
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.awaiting = 0;
    }

    /// Append a delayed message if its generation is still current
    pub fn deliver(
        &mut self,
        generation: u64,
        draft: MessageDraft,
        delay: Duration,
    ) -> Option<Message> {
        if generation != self.generation {
            tracing::debug!(
                session_id = %self.id,
                stale = generation,
                current = self.generation,
                "Dropping stale delayed message"
            );
            return None;
        }
        self.awaiting = self.awaiting.saturating_sub(1);
        let message = Message::from_draft(draft, delay);
        self.messages.push(message.clone());
        Some(message)
    }

    /// Clear the log after a close, unless a newer session has started since
    pub fn clear_log(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.messages.clear();
        true
    }
}
