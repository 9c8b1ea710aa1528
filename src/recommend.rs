//! Plan recommendation rule
//!
//! A priority-ordered decision list over the three guided answers. The order
//! of checks is the whole rule: there is no scoring.

use crate::catalog::{ChannelMix, Goal, PlanName, SpendBracket};
use serde::{Deserialize, Serialize};

/// Answers captured so far. Fields stay `None` until their question is answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub spend: Option<SpendBracket>,
    pub channels: Option<ChannelMix>,
    pub goal: Option<Goal>,
}

impl UserContext {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.spend.is_none() && self.channels.is_none() && self.goal.is_none()
    }

    /// The complete answer set, once all three questions are answered
    #[cfg(test)]
    pub fn answers(&self) -> Option<Answers> {
        Some(Answers {
            spend: self.spend?,
            channels: self.channels?,
            goal: self.goal?,
        })
    }
}

/// A fully answered questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answers {
    pub spend: SpendBracket,
    pub channels: ChannelMix,
    pub goal: Goal,
}

impl From<Answers> for UserContext {
    fn from(a: Answers) -> Self {
        Self {
            spend: Some(a.spend),
            channels: Some(a.channels),
            goal: Some(a.goal),
        }
    }
}

/// Pick a plan. First match wins.
pub fn recommend(answers: &Answers) -> PlanName {
    if answers.spend == SpendBracket::Enterprise {
        return PlanName::Scale;
    }
    if answers.channels == ChannelMix::Both {
        return PlanName::Growth;
    }
    if answers.goal == Goal::Analytics {
        return PlanName::Growth;
    }
    if answers.goal == Goal::Performance {
        return PlanName::Growth;
    }
    PlanName::Starter
}

/// Headline announcing the recommendation
pub fn recommendation_text(plan: PlanName) -> String {
    format!("Based on your inputs, {} is the best fit.", plan.title())
}

/// Fixed explanation shown after the recommendation
pub fn reasoning(plan: PlanName) -> &'static str {
    match plan {
        PlanName::Scale => {
            "Your spend volume requires enterprise-grade infrastructure and dedicated support."
        }
        PlanName::Growth => {
            "You’re actively running campaigns and need performance optimization with real-time attribution.\nGrowth gives you full intelligence without enterprise overhead."
        }
        PlanName::Starter => {
            "You are in the early stages of building visibility. Starter gives you the structured reporting you need without over-investing."
        }
    }
}
