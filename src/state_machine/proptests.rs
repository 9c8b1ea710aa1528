//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::catalog::{AnswerValue, ChannelMix, Goal, PlanName, SpendBracket};
use crate::message::Role;
use crate::recommend::{recommend, Answers};
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::default()
}

/// Messages appended by a result, with the log clear applied first
fn log_after(before: usize, result: &TransitionResult) -> usize {
    let mut len = before;
    for effect in &result.effects {
        match effect {
            Effect::StartSession => len = 0,
            Effect::AppendMessage { .. } => len += 1,
            Effect::EndSession { .. } | Effect::PublishState => {}
        }
    }
    len
}

fn clears_log(result: &TransitionResult) -> bool {
    result
        .effects
        .iter()
        .any(|e| matches!(e, Effect::StartSession | Effect::EndSession { .. }))
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_spend() -> impl Strategy<Value = SpendBracket> {
    prop::sample::select(SpendBracket::ALL.to_vec())
}

fn arb_channels() -> impl Strategy<Value = ChannelMix> {
    prop::sample::select(ChannelMix::ALL.to_vec())
}

fn arb_goal() -> impl Strategy<Value = Goal> {
    prop::sample::select(Goal::ALL.to_vec())
}

fn arb_answers() -> impl Strategy<Value = Answers> {
    (arb_spend(), arb_channels(), arb_goal()).prop_map(|(spend, channels, goal)| Answers {
        spend,
        channels,
        goal,
    })
}

fn arb_answer_value() -> impl Strategy<Value = AnswerValue> {
    prop_oneof![
        arb_spend().prop_map(AnswerValue::Spend),
        arb_channels().prop_map(AnswerValue::Channels),
        arb_goal().prop_map(AnswerValue::Goal),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        1 => Just(Action::Open),
        1 => Just(Action::Close),
        1 => Just(Action::Reset),
        1 => Just(Action::StartCompare),
        1 => Just(Action::StartGuided),
        1 => Just(Action::StartScaleInfo),
        1 => Just(Action::StartCustom),
        1 => Just(Action::CompareStarterGrowth),
        1 => Just(Action::CompareGrowthScale),
        1 => Just(Action::ListAllPlans),
        // Answers show up far more often than any one chip in real sessions
        4 => (arb_answer_value(), prop::option::of("[A-Za-z$ ]{0,12}"))
            .prop_map(|(value, label)| Action::Answer { value, label }),
    ]
}

fn arb_state() -> impl Strategy<Value = AssistantState> {
    prop_oneof![
        Just(AssistantState::Idle),
        Just(AssistantState::Open),
        Just(AssistantState::ComparePlans),
        Just(AssistantState::Question1),
        arb_spend().prop_map(|spend| AssistantState::Question2 { spend }),
        (arb_spend(), arb_channels())
            .prop_map(|(spend, channels)| AssistantState::Question3 { spend, channels }),
        arb_answers().prop_map(|answers| AssistantState::Recommendation {
            answers,
            plan: recommend(&answers),
        }),
        Just(AssistantState::ScaleInfo),
        Just(AssistantState::CustomRequirements),
    ]
}

fn arb_query() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ?]{0,40}",
        prop::sample::select(vec![
            "compare plans",
            "which plan is best for us",
            "we are an agency",
            "how much is it per month",
            "tell me about growth",
            "show me the options",
            "do you have attribution",
        ])
        .prop_map(String::from),
    ]
}

// ============================================================================
// State Validity Checkers
// ============================================================================

/// The recommendation stored in state always agrees with the decision rule
fn is_valid_state(state: &AssistantState) -> bool {
    match state {
        AssistantState::Recommendation { answers, plan } => recommend(answers) == *plan,
        _ => true,
    }
}

fn delays_are_ordered(effects: &[Effect]) -> bool {
    let delays: Vec<Duration> = effects.iter().filter_map(Effect::message_delay).collect();
    delays.windows(2).all(|w| w[0] <= w[1])
}

fn keeps<T: PartialEq>(before: Option<T>, after: Option<T>) -> bool {
    before.is_none() || before == after
}

/// Captured answers never go from known to different-known without a reset
fn context_extends(before: &AssistantState, after: &AssistantState) -> bool {
    let a = before.user_context();
    let b = after.user_context();
    keeps(a.spend, b.spend) && keeps(a.channels, b.channels) && keeps(a.goal, b.goal)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: Valid state after any sequence of actions
    #[test]
    fn prop_transitions_preserve_validity(actions in proptest::collection::vec(arb_action(), 0..30)) {
        let mut state = AssistantState::Idle;
        let ctx = test_context();

        for action in actions {
            if let Ok(result) = transition(&state, &ctx, action) {
                state = result.new_state;
                prop_assert!(is_valid_state(&state), "Invalid state: {:?}", state);
            }
        }
    }

    // Invariant 2: Message delays never go backwards within one result
    #[test]
    fn prop_delays_are_monotonic(state in arb_state(), action in arb_action()) {
        if let Ok(result) = transition(&state, &test_context(), action) {
            prop_assert!(
                delays_are_ordered(&result.effects),
                "Out of order delays: {:?}",
                result.effects
            );
        }
    }

    // Invariant 3: A user turn, when present, comes first and immediately
    #[test]
    fn prop_echo_leads_without_delay(state in arb_state(), action in arb_action()) {
        if let Ok(result) = transition(&state, &test_context(), action) {
            let messages: Vec<&Effect> = result
                .effects
                .iter()
                .filter(|e| e.message_delay().is_some())
                .collect();
            for (i, effect) in messages.iter().enumerate() {
                if effect.is_user_echo() {
                    prop_assert_eq!(i, 0);
                    prop_assert_eq!(effect.message_delay(), Some(Duration::ZERO));
                }
            }
        }
    }

    // Invariant 4: PublishState effect always emitted on state change
    #[test]
    fn prop_state_changes_publish(state in arb_state(), action in arb_action()) {
        if let Ok(result) = transition(&state, &test_context(), action) {
            if result.new_state != state {
                prop_assert!(
                    result.effects.contains(&Effect::PublishState),
                    "State changed but no PublishState effect: {:?} -> {:?}",
                    state,
                    result.new_state
                );
            }
        }
    }

    // Invariant 5: The log only shrinks on open, reset or close
    #[test]
    fn prop_log_is_append_only(
        state in arb_state(),
        action in arb_action(),
        before in 0usize..20
    ) {
        if let Ok(result) = transition(&state, &test_context(), action.clone()) {
            if !clears_log(&result) {
                prop_assert!(log_after(before, &result) >= before);
            } else {
                prop_assert!(action.is_lifecycle(), "{:?} cleared the log", action);
            }
        }
    }

    // Invariant 6: Answers are never overwritten, only extended or reset
    #[test]
    fn prop_context_is_monotonic(state in arb_state(), action in arb_action()) {
        if let Ok(result) = transition(&state, &test_context(), action.clone()) {
            if !action.is_lifecycle() {
                prop_assert!(
                    context_extends(&state, &result.new_state),
                    "{:?} rewrote context: {:?} -> {:?}",
                    action,
                    state,
                    result.new_state
                );
            }
        }
    }

    // Invariant 7: Reset from anywhere lands on a single greeting
    #[test]
    fn prop_reset_is_idempotent(state in arb_state()) {
        let ctx = test_context();
        let once = transition(&state, &ctx, Action::Reset).unwrap();
        let twice = transition(&once.new_state, &ctx, Action::Reset).unwrap();

        prop_assert_eq!(once.new_state, AssistantState::Open);
        prop_assert!(once.new_state.user_context().is_empty());
        prop_assert_eq!(log_after(7, &once), 1);
        prop_assert_eq!(&once.effects, &twice.effects);
    }

    // Invariant 8: Nothing but lifecycle actions is accepted while closed
    #[test]
    fn prop_idle_rejects_content(action in arb_action()) {
        let result = transition(&AssistantState::Idle, &test_context(), action.clone());
        prop_assert_eq!(result.is_ok(), action.is_lifecycle());
    }

    // Invariant 9: Rejected input is reported, never half-applied
    #[test]
    fn prop_rejection_is_total(state in arb_state(), action in arb_action()) {
        let ctx = test_context();
        match transition(&state, &ctx, action) {
            Ok(result) => prop_assert!(is_valid_state(&result.new_state)),
            Err(e) => prop_assert!(matches!(e, TransitionError::InvalidTransition(_))),
        }
    }

    // Invariant 10: Same input, same output
    #[test]
    fn prop_transition_is_deterministic(state in arb_state(), action in arb_action()) {
        let ctx = test_context();
        let a = transition(&state, &ctx, action.clone());
        let b = transition(&state, &ctx, action);
        prop_assert_eq!(a, b);
    }

    // Invariant 11: Typed text always echoes first and always gets a reply
    #[test]
    fn prop_query_echoes_then_replies(state in arb_state(), text in arb_query()) {
        match respond_to_query(&state, &test_context(), &text) {
            Ok(query) => {
                let effects = &query.result.effects;
                prop_assert!(effects[0].is_user_echo());
                prop_assert_eq!(effects.iter().filter(|e| e.is_user_echo()).count(), 1);
                prop_assert!(delays_are_ordered(effects));
                let first_reply = effects
                    .iter()
                    .skip(1)
                    .find_map(Effect::message_delay);
                prop_assert!(first_reply.is_some_and(|d| d >= transition::THINKING_DELAY));
            }
            Err(e) => {
                prop_assert_eq!(state, AssistantState::Idle);
                prop_assert_eq!(e, TransitionError::Closed);
            }
        }
    }

    // Invariant 12: Typed text never clears the log or skips a question
    #[test]
    fn prop_query_preserves_context(state in arb_state(), text in arb_query()) {
        if let Ok(query) = respond_to_query(&state, &test_context(), &text) {
            prop_assert!(!clears_log(&query.result));
            prop_assert!(context_extends(&state, &query.result.new_state));
        }
    }
}

// ============================================================================
// Sequence Tests - Multi-Step Scenarios
// ============================================================================

fn run(actions: Vec<Action>) -> (AssistantState, Vec<(Role, String)>) {
    let ctx = test_context();
    let mut state = AssistantState::Idle;
    let mut log = Vec::new();

    for action in actions {
        let result = transition(&state, &ctx, action).unwrap();
        for effect in result.effects {
            match effect {
                Effect::StartSession => log.clear(),
                Effect::AppendMessage { draft, .. } => log.push((draft.role, draft.text)),
                Effect::EndSession { .. } | Effect::PublishState => {}
            }
        }
        state = result.new_state;
    }
    (state, log)
}

/// Open, guided questions, recommendation
#[test]
fn test_guided_cycle() {
    let (state, log) = run(vec![
        Action::Open,
        Action::StartGuided,
        Action::answer(AnswerValue::Spend(SpendBracket::Mid)),
        Action::answer(AnswerValue::Channels(ChannelMix::Both)),
        Action::answer(AnswerValue::Goal(Goal::Performance)),
    ]);

    assert_eq!(
        state,
        AssistantState::Recommendation {
            answers: Answers {
                spend: SpendBracket::Mid,
                channels: ChannelMix::Both,
                goal: Goal::Performance,
            },
            plan: PlanName::Growth,
        }
    );
    // greeting + 3 exchanges of 2 + (echo, recommendation, reasoning)
    assert_eq!(log.len(), 10);
    assert_eq!(log[7], (Role::User, "Performance & conversions".to_string()));
    assert!(log[8].1.contains("Growth"));
}

/// Browsing comparisons and then asking for guidance
#[test]
fn test_compare_then_guided() {
    let (state, log) = run(vec![
        Action::Open,
        Action::StartCompare,
        Action::CompareStarterGrowth,
        Action::ListAllPlans,
        Action::StartGuided,
    ]);

    assert_eq!(state, AssistantState::Question1);
    assert_eq!(log.len(), 1 + 2 + 3 + 3 + 2);
    assert_eq!(log.last().map(|(r, _)| *r), Some(Role::Assistant));
}

/// Close and reopen starts from a clean greeting
#[test]
fn test_close_then_reopen() {
    let (state, log) = run(vec![
        Action::Open,
        Action::StartScaleInfo,
        Action::Close,
        Action::Open,
    ]);

    assert_eq!(state, AssistantState::Open);
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, Role::Assistant);
}

/// Every answer combination reaches exactly the plan the rule picks
#[test]
fn test_all_answer_paths_reach_recommendation() {
    let ctx = test_context();
    for spend in SpendBracket::ALL {
        for channels in ChannelMix::ALL {
            for goal in Goal::ALL {
                let (state, _) = run(vec![
                    Action::Open,
                    Action::StartGuided,
                    Action::answer(AnswerValue::Spend(spend)),
                    Action::answer(AnswerValue::Channels(channels)),
                    Action::answer(AnswerValue::Goal(goal)),
                ]);
                let expected = recommend(&Answers {
                    spend,
                    channels,
                    goal,
                });
                assert!(
                    matches!(state, AssistantState::Recommendation { plan, .. } if plan == expected)
                );
                // Terminal state takes no further answers
                assert!(transition(&state, &ctx, Action::answer(AnswerValue::Goal(goal))).is_err());
            }
        }
    }
}
