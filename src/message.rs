//! Chat log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Assistant,
    User,
}

/// Message text produced by a transition, before it is stamped and logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub role: Role,
    pub text: String,
}

impl MessageDraft {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }
}

/// An immutable log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    /// How long after the triggering input this message was scheduled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn from_draft(draft: MessageDraft, delay: Duration) -> Self {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: draft.role,
            text: draft.text,
            delay_ms: (delay_ms > 0).then_some(delay_ms),
            created_at: Utc::now(),
        }
    }

    /// Non-empty lines of the text, each rendered as its own paragraph
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_draft_assigns_unique_ids() {
        let a = Message::from_draft(MessageDraft::user("hi"), Duration::ZERO);
        let b = Message::from_draft(MessageDraft::user("hi"), Duration::ZERO);
        assert_ne!(a.id, b.id);
        assert_eq!(a.delay_ms, None);
    }

    #[test]
    fn test_delay_recorded() {
        let m = Message::from_draft(MessageDraft::assistant("x"), Duration::from_millis(400));
        assert_eq!(m.delay_ms, Some(400));
        assert_eq!(m.role, Role::Assistant);
    }

    #[test]
    fn test_paragraphs_skip_blank_lines() {
        let m = Message::from_draft(
            MessageDraft::assistant("First.\n\nSecond.\nThird."),
            Duration::ZERO,
        );
        let paras: Vec<_> = m.paragraphs().collect();
        assert_eq!(paras, vec!["First.", "Second.", "Third."]);
    }
}
