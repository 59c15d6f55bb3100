use std::time::Duration;

use crate::text::{SimilarityMethod, TextConfig};

/// Coarse candidates requested per result slot.
pub const OVERFETCH_FACTOR: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Upper bound on concurrent per-pair graph reads.
    pub max_concurrency: usize,
    pub pair_timeout: Duration,
    pub coarse_timeout: Duration,
    pub text: TextConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            pair_timeout: Duration::from_millis(5_000),
            coarse_timeout: Duration::from_millis(10_000),
            text: TextConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reads `SM_*` environment variables, keeping defaults for anything
    /// missing or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let parse_u64 = |key: &str| lookup(key).and_then(|raw| raw.trim().parse::<u64>().ok());
        let parse_bool = |key: &str, default: bool| match lookup(key) {
            Some(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
            None => default,
        };

        let max_concurrency = lookup("SM_MATCH_CONCURRENCY")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_concurrency)
            .max(1);

        let method = lookup("SM_TEXT_SIMILARITY")
            .and_then(|raw| SimilarityMethod::parse(&raw))
            .unwrap_or(defaults.text.method);

        Self {
            max_concurrency,
            pair_timeout: parse_u64("SM_PAIR_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.pair_timeout),
            coarse_timeout: parse_u64("SM_COARSE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.coarse_timeout),
            text: TextConfig {
                method,
                clamp_stretch: parse_bool("SM_CLAMP_TEXT_STRETCH", defaults.text.clamp_stretch),
            },
        }
    }
}
