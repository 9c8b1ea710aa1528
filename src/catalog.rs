//! Static content store: plan catalog and guided-question option lists
//!
//! The catalog is read-only reference data. The option *values* are fixed
//! enums the recommendation rule understands; everything a marketer may want
//! to change (labels, prices, features) is data and can be loaded from JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Option values
// ============================================================================

/// Plan identifiers, ordered from smallest to largest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanName {
    Starter,
    Growth,
    Scale,
}

impl PlanName {
    pub const ALL: [PlanName; 3] = [PlanName::Starter, PlanName::Growth, PlanName::Scale];

    /// Title-cased name used in assistant copy ("Growth")
    pub fn title(self) -> &'static str {
        match self {
            PlanName::Starter => "Starter",
            PlanName::Growth => "Growth",
            PlanName::Scale => "Scale",
        }
    }
}

impl fmt::Display for PlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Approximate monthly marketing spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpendBracket {
    Low,
    Mid,
    High,
    Enterprise,
}

impl SpendBracket {
    pub const ALL: [SpendBracket; 4] = [
        SpendBracket::Low,
        SpendBracket::Mid,
        SpendBracket::High,
        SpendBracket::Enterprise,
    ];
}

/// Channels the business currently runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelMix {
    Online,
    Offline,
    Both,
}

impl ChannelMix {
    pub const ALL: [ChannelMix; 3] = [ChannelMix::Online, ChannelMix::Offline, ChannelMix::Both];
}

/// Primary goal right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Goal {
    Visibility,
    Performance,
    Analytics,
}

impl Goal {
    pub const ALL: [Goal; 3] = [Goal::Visibility, Goal::Performance, Goal::Analytics];
}

/// Any value a guided-question chip can carry.
///
/// The ten wire values are distinct across the three lists, so a bare string
/// such as `"BOTH"` identifies both the question and the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnswerValue {
    Spend(SpendBracket),
    Channels(ChannelMix),
    Goal(Goal),
}

impl AnswerValue {
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerValue::Spend(SpendBracket::Low) => "LOW",
            AnswerValue::Spend(SpendBracket::Mid) => "MID",
            AnswerValue::Spend(SpendBracket::High) => "HIGH",
            AnswerValue::Spend(SpendBracket::Enterprise) => "ENTERPRISE",
            AnswerValue::Channels(ChannelMix::Online) => "ONLINE",
            AnswerValue::Channels(ChannelMix::Offline) => "OFFLINE",
            AnswerValue::Channels(ChannelMix::Both) => "BOTH",
            AnswerValue::Goal(Goal::Visibility) => "VISIBILITY",
            AnswerValue::Goal(Goal::Performance) => "PERFORMANCE",
            AnswerValue::Goal(Goal::Analytics) => "ANALYTICS",
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an option value outside the known vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown option value: {0}")]
pub struct UnknownAnswerValue(pub String);

impl FromStr for AnswerValue {
    type Err = UnknownAnswerValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => AnswerValue::Spend(SpendBracket::Low),
            "MID" => AnswerValue::Spend(SpendBracket::Mid),
            "HIGH" => AnswerValue::Spend(SpendBracket::High),
            "ENTERPRISE" => AnswerValue::Spend(SpendBracket::Enterprise),
            "ONLINE" => AnswerValue::Channels(ChannelMix::Online),
            "OFFLINE" => AnswerValue::Channels(ChannelMix::Offline),
            "BOTH" => AnswerValue::Channels(ChannelMix::Both),
            "VISIBILITY" => AnswerValue::Goal(Goal::Visibility),
            "PERFORMANCE" => AnswerValue::Goal(Goal::Performance),
            "ANALYTICS" => AnswerValue::Goal(Goal::Analytics),
            _ => return Err(UnknownAnswerValue(s.to_string())),
        };
        Ok(value)
    }
}

impl TryFrom<String> for AnswerValue {
    type Error = UnknownAnswerValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AnswerValue> for String {
    fn from(value: AnswerValue) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Catalog data
// ============================================================================

/// A `{label, value}` pair offered as a chip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: AnswerValue,
}

impl ChoiceOption {
    fn new(label: &str, value: AnswerValue) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// A plan descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: PlanName,
    /// Monthly price in whole US dollars
    pub price: u32,
    /// Human-readable outcome label ("PERFORMANCE & OPTIMIZATION")
    pub outcome: String,
    #[serde(default)]
    pub description: String,
    pub features: Vec<String>,
    #[serde(default)]
    pub recommended: bool,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// Plan catalog plus the three option lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub plans: Vec<Plan>,
    pub spend_options: Vec<ChoiceOption>,
    pub channel_options: Vec<ChoiceOption>,
    pub goal_options: Vec<ChoiceOption>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The catalog shipped with the site
    pub fn builtin() -> Self {
        Self {
            plans: vec![
                Plan {
                    name: PlanName::Starter,
                    price: 2000,
                    outcome: "VISIBILITY & FOUNDATION".to_string(),
                    description: "Foundation for visibility".to_string(),
                    features: strings(&[
                        "Basic Analytics Dashboard",
                        "2 Campaign Flows",
                        "Monthly Performance Report",
                        "Email Support",
                        "Standard API Access",
                    ]),
                    recommended: false,
                },
                Plan {
                    name: PlanName::Growth,
                    price: 4500,
                    outcome: "PERFORMANCE & OPTIMIZATION".to_string(),
                    description: "Scaling with intelligence".to_string(),
                    features: strings(&[
                        "Full AdGrid Intelligence",
                        "Unlimited Campaign Flows",
                        "Real-time Attribution",
                        "Priority 24/7 Support",
                        "Advanced Audience Segmentation",
                        "Integration Assistance",
                    ]),
                    recommended: true,
                },
                Plan {
                    name: PlanName::Scale,
                    price: 8000,
                    outcome: "DOMINANCE & DATA INTELLIGENCE".to_string(),
                    description: "Market leadership & domination".to_string(),
                    features: strings(&[
                        "Custom Data Warehousing",
                        "Dedicated Account Manager",
                        "Multi-Region Support",
                        "White-label Reports",
                        "On-premise Deployment Capability",
                    ]),
                    recommended: false,
                },
            ],
            spend_options: vec![
                ChoiceOption::new("Under $2,000", AnswerValue::Spend(SpendBracket::Low)),
                ChoiceOption::new("$2,000 – $5,000", AnswerValue::Spend(SpendBracket::Mid)),
                ChoiceOption::new("$5,000 – $15,000", AnswerValue::Spend(SpendBracket::High)),
                ChoiceOption::new("$15,000+", AnswerValue::Spend(SpendBracket::Enterprise)),
            ],
            channel_options: vec![
                ChoiceOption::new("Online only", AnswerValue::Channels(ChannelMix::Online)),
                ChoiceOption::new("Offline only", AnswerValue::Channels(ChannelMix::Offline)),
                ChoiceOption::new("Online + Offline", AnswerValue::Channels(ChannelMix::Both)),
            ],
            goal_options: vec![
                ChoiceOption::new("Visibility & awareness", AnswerValue::Goal(Goal::Visibility)),
                ChoiceOption::new(
                    "Performance & conversions",
                    AnswerValue::Goal(Goal::Performance),
                ),
                ChoiceOption::new("Analytics & attribution", AnswerValue::Goal(Goal::Analytics)),
            ],
        }
    }

    /// Load and validate a catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Parse and validate a catalog from a JSON string
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check that every plan and every option value appears exactly once,
    /// and that each option sits in the list for its own question.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for name in PlanName::ALL {
            let count = self.plans.iter().filter(|p| p.name == name).count();
            if count != 1 {
                return Err(CatalogError::Invalid(format!(
                    "expected exactly one {name} plan, found {count}"
                )));
            }
        }

        check_options(
            "spend_options",
            &self.spend_options,
            &SpendBracket::ALL.map(AnswerValue::Spend),
        )?;
        check_options(
            "channel_options",
            &self.channel_options,
            &ChannelMix::ALL.map(AnswerValue::Channels),
        )?;
        check_options(
            "goal_options",
            &self.goal_options,
            &Goal::ALL.map(AnswerValue::Goal),
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub fn plan(&self, name: PlanName) -> Option<&Plan> {
        self.plans.iter().find(|p| p.name == name)
    }

    /// Display label for an option value, if the catalog knows it
    pub fn label_for(&self, value: AnswerValue) -> Option<&str> {
        self.spend_options
            .iter()
            .chain(&self.channel_options)
            .chain(&self.goal_options)
            .find(|opt| opt.value == value)
            .map(|opt| opt.label.as_str())
    }

    /// "Starter is $2,000/mo. Growth is $4,500/mo. ..." in catalog order
    pub fn pricing_summary(&self) -> String {
        let mut summary = self
            .plans
            .iter()
            .map(|p| format!("{} is {}/mo.", p.name, format_usd(p.price)))
            .collect::<Vec<_>>()
            .join(" ");
        summary.push_str(" All plans are billed monthly with no lock-in contracts.");
        summary
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn check_options(
    list: &str,
    options: &[ChoiceOption],
    expected: &[AnswerValue],
) -> Result<(), CatalogError> {
    if let Some(stray) = options.iter().find(|o| !expected.contains(&o.value)) {
        return Err(CatalogError::Invalid(format!(
            "{list} contains {} which belongs to another question",
            stray.value
        )));
    }
    for value in expected {
        let count = options.iter().filter(|o| o.value == *value).count();
        if count != 1 {
            return Err(CatalogError::Invalid(format!(
                "{list} must contain {value} exactly once, found {count}"
            )));
        }
    }
    Ok(())
}

/// Format whole dollars with thousands separators: 4500 -> "$4,500"
pub fn format_usd(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
