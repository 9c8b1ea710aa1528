//! Keyword-based intent resolver for typed questions
//!
//! Deterministic substring matching against fixed keyword tables, checked in
//! a fixed priority order. The first matching table wins. There is no
//! learned model and no memory of earlier turns.

use crate::catalog::Catalog;
use crate::state_machine::transition::{ALL_PLANS_SUMMARY, COMPARE_SUGGESTION};
use crate::state_machine::Action;
use serde::Serialize;

/// What the visitor appears to be asking about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    ScaleSpecific,
    GrowthSpecific,
    StarterSpecific,
    ComparePlans,
    PlanRecommendation,
    CustomRequirement,
    GeneralOverview,
    FeatureExplanation,
    PricingQuestion,
    Unknown,
}

/// Priority-ordered keyword tables
const KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::ScaleSpecific,
        &["scale", "enterprise plan", "multi-region", "dedicated"],
    ),
    (
        Intent::GrowthSpecific,
        &["growth", "performance plan", "middle"],
    ),
    (Intent::StarterSpecific, &["starter", "basic plan", "small"]),
    (
        Intent::ComparePlans,
        &["compare", "difference", "vs", "versus", "better", "comparison"],
    ),
    (
        Intent::PlanRecommendation,
        &[
            "recommend",
            "best for",
            "which plan",
            "choose",
            "help me",
            "guide",
            "suggestion",
            "advice",
        ],
    ),
    (
        Intent::CustomRequirement,
        &[
            "enterprise",
            "custom",
            "white label",
            "api",
            "volume",
            "large",
            "agency",
        ],
    ),
    (
        Intent::GeneralOverview,
        &[
            "plans",
            "overview",
            "options",
            "what do you have",
            "list",
            "show me",
        ],
    ),
    (
        Intent::FeatureExplanation,
        &[
            "features",
            "analytics",
            "tracking",
            "attribution",
            "dashboard",
            "reporting",
            "intelligence",
            "channels",
        ],
    ),
    (
        Intent::PricingQuestion,
        &[
            "cost",
            "price",
            "expensive",
            "cheap",
            "rates",
            "billing",
            "afford",
            "budget",
            "month",
        ],
    ),
];

const SCALE_RESPONSE: &str = "Scale is our enterprise solution. It includes custom data warehousing, multi-region support, and a dedicated account manager.";
const GROWTH_RESPONSE: &str = "Growth is our most popular plan for active advertisers. It unlocks real-time attribution, audience segmentation, and unlimited campaign flows.";
const STARTER_RESPONSE: &str = "Starter creates a foundation for visibility. You get basic analytics, monthly reports, and standard API access.";
const FEATURE_RESPONSE: &str = "All plans include our AdGrid Intelligence Core for real-time tracking. Higher tiers unlock deeper attribution, segmentation, and custom warehousing.";
const FALLBACK_RESPONSE: &str = "I focus strictly on pricing strategy and plan comparisons. For detailed service inquiries, please contact our team directly.";

/// How a query is answered
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Feed this action to the state machine
    Action(Action),
    /// Reply with canned text, optionally followed by a nudge
    Direct {
        text: String,
        follow_up: Option<&'static str>,
    },
}

/// Outcome of resolving a query
#[derive(Debug, Clone, PartialEq)]
pub struct IntentResult {
    pub intent: Intent,
    /// Informational only; never used for branching
    pub confidence: f32,
    pub resolution: Resolution,
}

impl Intent {
    /// Reported confidence for a match on this intent
    pub fn confidence(self) -> f32 {
        match self {
            Intent::ScaleSpecific | Intent::GrowthSpecific | Intent::StarterSpecific => 0.9,
            Intent::ComparePlans | Intent::PlanRecommendation | Intent::CustomRequirement => 0.8,
            Intent::GeneralOverview | Intent::FeatureExplanation | Intent::PricingQuestion => 0.7,
            Intent::Unknown => 0.0,
        }
    }
}

/// Map a free-text query to a direct response or an action
pub fn resolve_intent(query: &str, catalog: &Catalog) -> IntentResult {
    let text = query.trim().to_lowercase();

    let intent = KEYWORDS
        .iter()
        .find(|(_, keywords)| matches_any(&text, keywords))
        .map_or(Intent::Unknown, |(intent, _)| *intent);

    let direct = |text: &str| Resolution::Direct {
        text: text.to_string(),
        follow_up: None,
    };
    let resolution = match intent {
        Intent::ScaleSpecific => direct(SCALE_RESPONSE),
        Intent::GrowthSpecific => direct(GROWTH_RESPONSE),
        Intent::StarterSpecific => direct(STARTER_RESPONSE),
        Intent::ComparePlans => Resolution::Action(Action::StartCompare),
        Intent::PlanRecommendation => Resolution::Action(Action::StartGuided),
        Intent::CustomRequirement => Resolution::Action(Action::StartCustom),
        Intent::GeneralOverview => direct(ALL_PLANS_SUMMARY),
        Intent::FeatureExplanation => Resolution::Direct {
            text: FEATURE_RESPONSE.to_string(),
            follow_up: Some(COMPARE_SUGGESTION),
        },
        Intent::PricingQuestion => Resolution::Direct {
            text: catalog.pricing_summary(),
            follow_up: Some(COMPARE_SUGGESTION),
        },
        Intent::Unknown => direct(FALLBACK_RESPONSE),
    };

    tracing::debug!(intent = ?intent, "resolved query");

    IntentResult {
        intent,
        confidence: intent.confidence(),
        resolution,
    }
}

fn matches_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}
