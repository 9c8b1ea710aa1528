//! Pure state transition function
//!
//! Given the same state, context and action, `transition` always produces the
//! same new state and effects (message ids and timestamps are assigned later,
//! by the session). There is no I/O here.

use super::{Action, AssistantState, Effect, SessionContext};
use crate::catalog::AnswerValue;
use crate::intent::{resolve_intent, IntentResult, Resolution};
use crate::recommend::{reasoning, recommend, recommendation_text, Answers};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Copy
// ============================================================================

pub(crate) const GREETING: &str =
    "I can help you compare plans or guide you to the right option based on your goals.";
const COMPARE_PROMPT: &str = "Which plans would you like to compare?";
const SPEND_QUESTION: &str = "What’s your approximate monthly marketing spend?";
const CHANNEL_QUESTION: &str = "Which channels are you currently using?";
const GOAL_QUESTION: &str = "What’s your primary goal right now?";
const SCALE_DESCRIPTION: &str =
    "Scale is built for brands operating across regions or channels that need deep intelligence.";
const CUSTOM_INTRO: &str = "Custom setups vary based on channels, regions, and data depth.";
const CUSTOM_HANDOFF: &str =
    "The fastest way to evaluate this is a short conversation with our team.";
const STARTER_VS_GROWTH: &str = "Starter is designed for establishing visibility and structured reporting.\n\nGrowth is built for performance optimization, attribution, and scaling campaigns with intelligence.\n\nIf you’re actively spending on ads and need deeper analytics, Growth is usually the right move.";
const GROWTH_VS_SCALE: &str = "Growth offers full intelligence and attribution for single-region dominance.\n\nScale adds multi-region warehousing, dedicated management, and custom enterprise integrations.";
pub(crate) const ALL_PLANS_SUMMARY: &str = "Starter: Validation & Visibility.\nGrowth: Performance & Attribution.\nScale: Enterprise Intelligence & Custom Data.";
const DECIDE_PROMPT: &str = "Want help deciding?";
pub(crate) const COMPARE_SUGGESTION: &str = "Would you like to compare the plans?";
const STEP_HINT: &str = "Let’s finish the current step first, or reset to start over.";
const RESTART_HINT: &str =
    "You already have a recommendation. Reset to start over, or ask me about a specific plan.";

// ============================================================================
// Timing (cumulative from the moment the input arrives)
// ============================================================================

const REPLY_DELAY: Duration = Duration::from_millis(400);
const CUSTOM_HANDOFF_DELAY: Duration = Duration::from_millis(400 + 800);
const COMPARE_REPLY_DELAY: Duration = Duration::from_millis(500);
const COMPARE_FOLLOW_UP_DELAY: Duration = Duration::from_millis(500 + 1200);
const RECOMMENDATION_DELAY: Duration = Duration::from_millis(500);
const REASONING_DELAY: Duration = Duration::from_millis(500 + 600);
/// Pause before answering typed text
pub(crate) const THINKING_DELAY: Duration = Duration::from_millis(600);
const SUGGESTION_DELAY: Duration = Duration::from_millis(600 + 1500);

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: AssistantState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: AssistantState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Assistant is closed")]
    Closed,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
///
/// Actions that are not valid in `state` return `InvalidTransition`; callers
/// treat that as a no-op.
pub fn transition(
    state: &AssistantState,
    context: &SessionContext,
    action: Action,
) -> Result<TransitionResult, TransitionError> {
    let result = apply(state, context, action)?;
    if result.new_state == *state || result.effects.contains(&Effect::PublishState) {
        Ok(result)
    } else {
        Ok(result.with_effect(Effect::PublishState))
    }
}

#[allow(clippy::too_many_lines)]
fn apply(
    state: &AssistantState,
    context: &SessionContext,
    action: Action,
) -> Result<TransitionResult, TransitionError> {
    match (*state, action) {
        // ============================================================
        // Lifecycle
        // ============================================================
        (_, Action::Open | Action::Reset) => Ok(TransitionResult::new(AssistantState::Open)
            .with_effect(Effect::StartSession)
            .with_effect(Effect::say(GREETING, Duration::ZERO))
            .with_effect(Effect::PublishState)),

        (_, Action::Close) => Ok(TransitionResult::new(AssistantState::Idle)
            .with_effect(Effect::EndSession {
                clear_after: context.exit_delay,
            })
            .with_effect(Effect::PublishState)),

        // ============================================================
        // Entry points
        // ============================================================
        (s, action @ Action::StartCompare) if s.accepts_start() => {
            Ok(TransitionResult::new(AssistantState::ComparePlans)
                .with_effects(exchange(&action, &[(COMPARE_PROMPT, REPLY_DELAY)])))
        }

        (s, action @ Action::StartGuided) if s.accepts_start() => {
            Ok(TransitionResult::new(AssistantState::Question1)
                .with_effects(exchange(&action, &[(SPEND_QUESTION, REPLY_DELAY)])))
        }

        (s, action @ Action::StartScaleInfo) if s.accepts_start() => {
            Ok(TransitionResult::new(AssistantState::ScaleInfo)
                .with_effects(exchange(&action, &[(SCALE_DESCRIPTION, REPLY_DELAY)])))
        }

        (s, action @ Action::StartCustom) if s.accepts_start() => {
            Ok(TransitionResult::new(AssistantState::CustomRequirements).with_effects(exchange(
                &action,
                &[
                    (CUSTOM_INTRO, REPLY_DELAY),
                    (CUSTOM_HANDOFF, CUSTOM_HANDOFF_DELAY),
                ],
            )))
        }

        // ============================================================
        // Comparisons
        // ============================================================
        (
            AssistantState::ComparePlans,
            action @ (Action::CompareStarterGrowth
            | Action::CompareGrowthScale
            | Action::ListAllPlans),
        ) => {
            let comparison = match action {
                Action::CompareStarterGrowth => STARTER_VS_GROWTH,
                Action::CompareGrowthScale => GROWTH_VS_SCALE,
                _ => ALL_PLANS_SUMMARY,
            };
            Ok(
                TransitionResult::new(AssistantState::ComparePlans).with_effects(exchange(
                    &action,
                    &[
                        (comparison, COMPARE_REPLY_DELAY),
                        (DECIDE_PROMPT, COMPARE_FOLLOW_UP_DELAY),
                    ],
                )),
            )
        }

        // ============================================================
        // Guided questions
        // ============================================================
        (
            AssistantState::Question1,
            Action::Answer {
                value: value @ AnswerValue::Spend(spend),
                label,
            },
        ) => Ok(TransitionResult::new(AssistantState::Question2 { spend })
            .with_effect(answer_echo(context, value, label))
            .with_effect(Effect::say(CHANNEL_QUESTION, REPLY_DELAY))),

        (
            AssistantState::Question2 { spend },
            Action::Answer {
                value: value @ AnswerValue::Channels(channels),
                label,
            },
        ) => Ok(
            TransitionResult::new(AssistantState::Question3 { spend, channels })
                .with_effect(answer_echo(context, value, label))
                .with_effect(Effect::say(GOAL_QUESTION, REPLY_DELAY)),
        ),

        (
            AssistantState::Question3 { spend, channels },
            Action::Answer {
                value: value @ AnswerValue::Goal(goal),
                label,
            },
        ) => {
            let answers = Answers {
                spend,
                channels,
                goal,
            };
            let plan = recommend(&answers);
            Ok(
                TransitionResult::new(AssistantState::Recommendation { answers, plan })
                    .with_effect(answer_echo(context, value, label))
                    .with_effect(Effect::say(
                        recommendation_text(plan),
                        RECOMMENDATION_DELAY,
                    ))
                    .with_effect(Effect::say(reasoning(plan), REASONING_DELAY)),
            )
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (AssistantState::Idle, action) => Err(TransitionError::InvalidTransition(format!(
            "{} ignored while closed",
            action.kind()
        ))),

        (state, action) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with action {}",
            state.name(),
            action.kind()
        ))),
    }
}

/// Result of answering typed text
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTransition {
    pub intent: IntentResult,
    pub result: TransitionResult,
}

/// Pure handling of a free-text query.
///
/// The typed text becomes the user's turn. A direct response follows after
/// the thinking delay; a resolved action runs through `transition` with its
/// own chip echo dropped and its replies shifted by the same delay.
pub fn respond_to_query(
    state: &AssistantState,
    context: &SessionContext,
    text: &str,
) -> Result<QueryTransition, TransitionError> {
    if !state.is_open() {
        return Err(TransitionError::Closed);
    }

    let intent = resolve_intent(text, &context.catalog);
    let echo = Effect::echo(text.trim());

    let result = match &intent.resolution {
        Resolution::Direct { text: reply, follow_up } => {
            let mut result = TransitionResult::new(*state)
                .with_effect(echo)
                .with_effect(Effect::say(reply.clone(), THINKING_DELAY));
            if let Some(follow_up) = follow_up {
                result = result.with_effect(Effect::say(*follow_up, SUGGESTION_DELAY));
            }
            result
        }
        Resolution::Action(action) => match transition(state, context, action.clone()) {
            Ok(delegated) => TransitionResult::new(delegated.new_state)
                .with_effect(echo)
                .with_effects(
                    delegated
                        .effects
                        .into_iter()
                        .filter(|e| !e.is_user_echo())
                        .map(|e| e.delayed_by(THINKING_DELAY)),
                ),
            Err(_) => TransitionResult::new(*state)
                .with_effect(echo)
                .with_effect(Effect::say(hint_for(state), THINKING_DELAY)),
        },
    };

    Ok(QueryTransition { intent, result })
}

// Helper functions

/// Reply to a typed request the current state can't take
fn hint_for(state: &AssistantState) -> &'static str {
    match state {
        AssistantState::Recommendation { .. } => RESTART_HINT,
        _ => STEP_HINT,
    }
}

/// User echo of a chip followed by assistant replies
fn exchange(action: &Action, replies: &[(&str, Duration)]) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(replies.len() + 1);
    if let Some(label) = action.chip_label() {
        effects.push(Effect::echo(label));
    }
    effects.extend(
        replies
            .iter()
            .map(|(text, delay)| Effect::say(*text, *delay)),
    );
    effects
}

fn answer_echo(context: &SessionContext, value: AnswerValue, label: Option<String>) -> Effect {
    let text = label
        .filter(|l| !l.trim().is_empty())
        .or_else(|| context.catalog.label_for(value).map(str::to_string))
        .unwrap_or_else(|| value.as_str().to_string());
    Effect::echo(text)
}
