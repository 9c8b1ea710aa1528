//! Assistant state types

use super::action::{Action, ActionRequest};
use crate::catalog::{Catalog, ChannelMix, ChoiceOption, PlanName, SpendBracket};
use crate::recommend::{Answers, UserContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Where the session is in the dialogue.
///
/// Answers travel inside the question states, so the recommendation can only
/// be reached with a complete answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantState {
    /// Widget closed
    #[default]
    Idle,

    /// Greeting shown, entry chips offered
    Open,

    /// Choosing which plans to compare
    ComparePlans,

    /// Asking for monthly spend
    #[serde(rename = "question_1")]
    Question1,

    /// Asking for channels
    #[serde(rename = "question_2")]
    Question2 { spend: SpendBracket },

    /// Asking for the primary goal
    #[serde(rename = "question_3")]
    Question3 {
        spend: SpendBracket,
        channels: ChannelMix,
    },

    /// Recommendation given
    Recommendation { answers: Answers, plan: PlanName },

    /// Scale description shown
    ScaleInfo,

    /// Custom requirements hand-off
    CustomRequirements,
}

impl AssistantState {
    /// Short snake-case name for logs
    pub fn name(&self) -> &'static str {
        match self {
            AssistantState::Idle => "idle",
            AssistantState::Open => "open",
            AssistantState::ComparePlans => "compare_plans",
            AssistantState::Question1 => "question_1",
            AssistantState::Question2 { .. } => "question_2",
            AssistantState::Question3 { .. } => "question_3",
            AssistantState::Recommendation { .. } => "recommendation",
            AssistantState::ScaleInfo => "scale_info",
            AssistantState::CustomRequirements => "custom_requirements",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, AssistantState::Idle)
    }

    /// States from which an entry chip (compare, guided, scale, custom) may be
    /// taken. These are exactly the open states with an empty context.
    pub fn accepts_start(&self) -> bool {
        matches!(
            self,
            AssistantState::Open
                | AssistantState::ComparePlans
                | AssistantState::ScaleInfo
                | AssistantState::CustomRequirements
        )
    }

    /// The answers captured so far
    pub fn user_context(&self) -> UserContext {
        match *self {
            AssistantState::Question2 { spend } => UserContext {
                spend: Some(spend),
                ..UserContext::default()
            },
            AssistantState::Question3 { spend, channels } => UserContext {
                spend: Some(spend),
                channels: Some(channels),
                goal: None,
            },
            AssistantState::Recommendation { answers, .. } => answers.into(),
            _ => UserContext::default(),
        }
    }

    /// Chips the presentation layer should offer in this state.
    ///
    /// `comparison_shown` is set once a comparison reply has landed in the
    /// log; only then does `ComparePlans` offer the guided flow as next step.
    pub fn chips(&self, catalog: &Catalog, comparison_shown: bool) -> Vec<Chip> {
        match self {
            AssistantState::Open => Chip::fixed(&[
                Action::StartCompare,
                Action::StartGuided,
                Action::StartScaleInfo,
                Action::StartCustom,
            ]),
            AssistantState::ComparePlans if comparison_shown => Chip::fixed(&[
                Action::CompareStarterGrowth,
                Action::CompareGrowthScale,
                Action::ListAllPlans,
                Action::StartGuided,
            ]),
            AssistantState::ComparePlans => Chip::fixed(&[
                Action::CompareStarterGrowth,
                Action::CompareGrowthScale,
                Action::ListAllPlans,
            ]),
            AssistantState::Question1 => Chip::options(&catalog.spend_options),
            AssistantState::Question2 { .. } => Chip::options(&catalog.channel_options),
            AssistantState::Question3 { .. } => Chip::options(&catalog.goal_options),
            AssistantState::Idle
            | AssistantState::Recommendation { .. }
            | AssistantState::ScaleInfo
            | AssistantState::CustomRequirements => vec![],
        }
    }

    /// Hand-off link offered once the assistant has said what it can
    pub fn contact(&self) -> Option<ContactLink> {
        let label = match self {
            AssistantState::CustomRequirements => "Start a conversation",
            AssistantState::Recommendation { .. } | AssistantState::ScaleInfo => {
                "Contact the team"
            }
            _ => return None,
        };
        Some(ContactLink {
            label,
            href: CONTACT_PATH,
        })
    }
}

/// Where the contact link points
const CONTACT_PATH: &str = "/contact";

/// A link out of the assistant to the contact page. Not an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContactLink {
    pub label: &'static str,
    pub href: &'static str,
}

/// A UI button representing one valid action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chip {
    pub label: String,
    pub action: ActionRequest,
}

impl Chip {
    fn fixed(actions: &[Action]) -> Vec<Chip> {
        actions
            .iter()
            .filter_map(|a| {
                a.chip_label().map(|label| Chip {
                    label: label.to_string(),
                    action: a.to_request(),
                })
            })
            .collect()
    }

    fn options(options: &[ChoiceOption]) -> Vec<Chip> {
        options
            .iter()
            .map(|opt| Chip {
                label: opt.label.clone(),
                action: Action::Answer {
                    value: opt.value,
                    label: Some(opt.label.clone()),
                }
                .to_request(),
            })
            .collect()
    }
}

/// Default time the panel takes to animate out before its log is cleared
pub const DEFAULT_EXIT_DELAY: Duration = Duration::from_millis(500);

/// Immutable configuration shared by every transition of a session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub catalog: Arc<Catalog>,
    pub exit_delay: Duration,
}

impl SessionContext {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            exit_delay: DEFAULT_EXIT_DELAY,
        }
    }

    #[must_use]
    pub fn with_exit_delay(mut self, exit_delay: Duration) -> Self {
        self.exit_delay = exit_delay;
        self
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::builtin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Goal;

    #[test]
    fn test_user_context_follows_state() {
        assert!(AssistantState::Open.user_context().is_empty());

        let q3 = AssistantState::Question3 {
            spend: SpendBracket::Mid,
            channels: ChannelMix::Both,
        };
        let ctx = q3.user_context();
        assert_eq!(ctx.spend, Some(SpendBracket::Mid));
        assert_eq!(ctx.channels, Some(ChannelMix::Both));
        assert_eq!(ctx.goal, None);

        let rec = AssistantState::Recommendation {
            answers: Answers {
                spend: SpendBracket::Low,
                channels: ChannelMix::Online,
                goal: Goal::Analytics,
            },
            plan: PlanName::Growth,
        };
        assert!(rec.user_context().answers().is_some());
    }

    #[test]
    fn test_chips_per_state() {
        let catalog = Catalog::builtin();
        assert!(AssistantState::Idle.chips(&catalog, false).is_empty());
        assert_eq!(AssistantState::Open.chips(&catalog, false).len(), 4);
        assert_eq!(AssistantState::Question1.chips(&catalog, false).len(), 4);

        let compare = AssistantState::ComparePlans.chips(&catalog, false);
        assert_eq!(compare.len(), 3);
        assert_eq!(compare[0].label, "Starter vs Growth");
        assert_eq!(compare[0].action.kind, "STARTER_VS_GROWTH");

        let channels = AssistantState::Question2 {
            spend: SpendBracket::Low,
        }
        .chips(&catalog, false);
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[2].label, "Online + Offline");
        assert_eq!(channels[2].action.kind, "ANSWER");
    }

    #[test]
    fn test_guided_chip_follows_a_comparison() {
        let catalog = Catalog::builtin();
        let compared = AssistantState::ComparePlans.chips(&catalog, true);
        assert_eq!(compared.len(), 4);
        assert_eq!(compared[3].label, "Which plan fits my business?");
        assert_eq!(compared[3].action.kind, "START_GUIDED");

        // Only the comparison state cares
        assert_eq!(
            AssistantState::Open.chips(&catalog, true),
            AssistantState::Open.chips(&catalog, false)
        );
    }

    #[test]
    fn test_contact_link_per_state() {
        assert_eq!(AssistantState::Open.contact(), None);
        assert_eq!(AssistantState::Question1.contact(), None);
        assert_eq!(AssistantState::ComparePlans.contact(), None);

        let custom = AssistantState::CustomRequirements.contact().unwrap();
        assert_eq!(custom.label, "Start a conversation");
        assert_eq!(custom.href, "/contact");
        assert_eq!(
            AssistantState::ScaleInfo.contact().map(|c| c.label),
            Some("Contact the team")
        );

        let rec = AssistantState::Recommendation {
            answers: Answers {
                spend: SpendBracket::Mid,
                channels: ChannelMix::Both,
                goal: Goal::Performance,
            },
            plan: PlanName::Growth,
        };
        assert_eq!(rec.contact().map(|c| c.label), Some("Contact the team"));
    }

    #[test]
    fn test_state_serializes_with_type_tag() {
        let json = serde_json::to_value(AssistantState::Question2 {
            spend: SpendBracket::High,
        })
        .unwrap();
        assert_eq!(json["type"], "question_2");
        assert_eq!(json["spend"], "HIGH");
    }
}
