//! Key Helpers
//!
//! Deterministic key construction and the standard TTLs used across the
//! rental domain.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

// == Cache Key ==
/// Builds a cache key as `prefix:name1:value1|name2:value2`.
///
/// Parameters are sorted by name so the same set of parameters always yields
/// the same key, whatever order the caller passes them in.
pub fn cache_key<I, K, V>(prefix: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: fmt::Display,
{
    let sorted: BTreeMap<String, String> = params
        .into_iter()
        .map(|(name, value)| (name.into(), value.to_string()))
        .collect();

    let joined = sorted
        .iter()
        .map(|(name, value)| format!("{}:{}", name, value))
        .collect::<Vec<_>>()
        .join("|");

    format!("{}:{}", prefix, joined)
}

// == TTL Presets ==
/// Standard TTLs per kind of cached record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlPreset {
    User,
    Property,
    Contract,
    Payment,
    Legal,
    Stats,
}

impl TtlPreset {
    pub fn ttl(self) -> Duration {
        let minutes = match self {
            TtlPreset::User => 10,
            TtlPreset::Property => 15,
            TtlPreset::Contract => 5,
            TtlPreset::Payment => 2,
            TtlPreset::Legal => 30,
            TtlPreset::Stats => 1,
        };
        Duration::from_secs(minutes * 60)
    }
}
