//! Actions that drive the assistant

use crate::catalog::AnswerValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Discrete inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Lifecycle
    Open,
    Close,
    Reset,

    // Entry points
    StartCompare,
    StartGuided,
    StartScaleInfo,
    StartCustom,

    // Comparison chips
    CompareStarterGrowth,
    CompareGrowthScale,
    ListAllPlans,

    // Guided questions
    Answer {
        value: AnswerValue,
        /// Chip label to echo; falls back to the catalog label
        label: Option<String>,
    },
}

/// Wire form of an action: a kind string plus optional payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Unknown action kind: {0}")]
    UnknownKind(String),
    #[error("Action {0} requires a payload")]
    MissingPayload(&'static str),
    #[error("Invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
struct AnswerPayload {
    value: AnswerValue,
    #[serde(default)]
    label: Option<String>,
}

impl Action {
    pub fn answer(value: AnswerValue) -> Self {
        Action::Answer { value, label: None }
    }

    /// Wire kind string
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Open => "OPEN",
            Action::Close => "CLOSE",
            Action::Reset => "RESET",
            Action::StartCompare => "START_COMPARE",
            Action::StartGuided => "START_GUIDED",
            Action::StartScaleInfo => "START_SCALE",
            Action::StartCustom => "START_CUSTOM",
            Action::CompareStarterGrowth => "STARTER_VS_GROWTH",
            Action::CompareGrowthScale => "GROWTH_VS_SCALE",
            Action::ListAllPlans => "ALL_PLANS",
            Action::Answer { .. } => "ANSWER",
        }
    }

    /// Fixed chip label, echoed as the user's turn. Answers use their option label.
    pub fn chip_label(&self) -> Option<&'static str> {
        match self {
            Action::StartCompare => Some("Compare plans"),
            Action::StartGuided => Some("Which plan fits my business?"),
            Action::StartScaleInfo => Some("What’s included in Scale?"),
            Action::StartCustom => Some("Custom requirements"),
            Action::CompareStarterGrowth => Some("Starter vs Growth"),
            Action::CompareGrowthScale => Some("Growth vs Scale"),
            Action::ListAllPlans => Some("All plans"),
            Action::Open | Action::Close | Action::Reset | Action::Answer { .. } => None,
        }
    }

    /// One of the side-by-side plan comparisons
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Action::CompareStarterGrowth | Action::CompareGrowthScale | Action::ListAllPlans
        )
    }

    #[cfg(test)]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Action::Open | Action::Close | Action::Reset)
    }

    /// Parse the wire form. Kind matching is case-insensitive.
    pub fn parse(kind: &str, payload: Option<&Value>) -> Result<Self, ActionError> {
        let action = match kind.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Action::Open,
            "CLOSE" => Action::Close,
            "RESET" => Action::Reset,
            "START_COMPARE" => Action::StartCompare,
            "START_GUIDED" => Action::StartGuided,
            "START_SCALE" => Action::StartScaleInfo,
            "START_CUSTOM" => Action::StartCustom,
            "STARTER_VS_GROWTH" => Action::CompareStarterGrowth,
            "GROWTH_VS_SCALE" => Action::CompareGrowthScale,
            "ALL_PLANS" => Action::ListAllPlans,
            "ANSWER" => parse_answer(payload)?,
            _ => return Err(ActionError::UnknownKind(kind.to_string())),
        };
        Ok(action)
    }

    pub fn to_request(&self) -> ActionRequest {
        let payload = match self {
            Action::Answer { value, label } => {
                let mut payload = serde_json::json!({ "value": value.as_str() });
                if let Some(label) = label {
                    payload["label"] = Value::String(label.clone());
                }
                Some(payload)
            }
            _ => None,
        };
        ActionRequest {
            kind: self.kind().to_string(),
            payload,
        }
    }
}

fn parse_answer(payload: Option<&Value>) -> Result<Action, ActionError> {
    let invalid = |reason: String| ActionError::InvalidPayload {
        kind: "ANSWER",
        reason,
    };

    match payload {
        None | Some(Value::Null) => Err(ActionError::MissingPayload("ANSWER")),
        // Bare value shorthand: "LOW"
        Some(Value::String(raw)) => raw
            .parse()
            .map(Action::answer)
            .map_err(|e| invalid(e.to_string())),
        Some(other) => {
            let parsed: AnswerPayload =
                serde_json::from_value(other.clone()).map_err(|e| invalid(e.to_string()))?;
            Ok(Action::Answer {
                value: parsed.value,
                label: parsed.label,
            })
        }
    }
}

impl TryFrom<ActionRequest> for Action {
    type Error = ActionError;

    fn try_from(req: ActionRequest) -> Result<Self, Self::Error> {
        Action::parse(&req.kind, req.payload.as_ref())
    }
}
