//! Server configuration from the environment

use std::path::PathBuf;
use std::time::Duration;

use crate::runtime::DEFAULT_IDLE_TTL;
use crate::state_machine::DEFAULT_EXIT_DELAY;

pub const DEFAULT_PORT: u16 = 8000;

const PORT_VAR: &str = "PRICING_ASSISTANT_PORT";
const CATALOG_VAR: &str = "PRICING_ASSISTANT_CATALOG";
const EXIT_DELAY_VAR: &str = "PRICING_ASSISTANT_EXIT_DELAY_MS";
const IDLE_TTL_VAR: &str = "PRICING_ASSISTANT_SESSION_IDLE_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub port: u16,
    /// JSON catalog to load instead of the built-in one
    pub catalog_path: Option<PathBuf>,
    pub exit_delay: Duration,
    /// Sessions with no input and no subscriber for this long are dropped
    pub idle_ttl: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            catalog_path: None,
            exit_delay: DEFAULT_EXIT_DELAY,
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = parse_or(&lookup, PORT_VAR, defaults.port);
        let exit_delay = Duration::from_millis(parse_or(
            &lookup,
            EXIT_DELAY_VAR,
            u64::try_from(defaults.exit_delay.as_millis()).unwrap_or(u64::MAX),
        ));
        let idle_ttl = Duration::from_secs(parse_or(
            &lookup,
            IDLE_TTL_VAR,
            defaults.idle_ttl.as_secs(),
        ));
        let catalog_path = lookup(CATALOG_VAR)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Self {
            port,
            catalog_path,
            exit_delay,
            idle_ttl,
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            default
        }),
    }
}
