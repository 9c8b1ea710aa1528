//! Effects produced by state transitions

use crate::message::{MessageDraft, Role};
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin a fresh session: invalidate pending delayed work and clear the log
    StartSession,

    /// Append a message once `delay` has elapsed since the input arrived
    AppendMessage { draft: MessageDraft, delay: Duration },

    /// Tear the session down: invalidate pending delayed work now, clear the
    /// log after `clear_after` (the panel's exit animation)
    EndSession { clear_after: Duration },

    /// Notify subscribers of the new state
    PublishState,
}

impl Effect {
    /// Immediate user turn
    pub fn echo(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            draft: MessageDraft::user(text),
            delay: Duration::ZERO,
        }
    }

    /// Assistant reply after `delay`
    pub fn say(text: impl Into<String>, delay: Duration) -> Self {
        Effect::AppendMessage {
            draft: MessageDraft::assistant(text),
            delay,
        }
    }

    pub fn is_user_echo(&self) -> bool {
        matches!(
            self,
            Effect::AppendMessage {
                draft: MessageDraft {
                    role: Role::User,
                    ..
                },
                ..
            }
        )
    }

    /// Delay of an `AppendMessage`, `None` for every other effect
    #[cfg(test)]
    pub fn message_delay(&self) -> Option<Duration> {
        match self {
            Effect::AppendMessage { delay, .. } => Some(*delay),
            _ => None,
        }
    }

    /// Push an `AppendMessage` later in time; other effects pass through
    #[must_use]
    pub fn delayed_by(self, offset: Duration) -> Self {
        match self {
            Effect::AppendMessage { draft, delay } => Effect::AppendMessage {
                draft,
                delay: delay + offset,
            },
            other => other,
        }
    }
}
