//! # Source Weights
//!
//! Maps a source category to the weight it carries in the overall index.
//!
//! - Canonical labels are `news` and `social` (see [`SourceKind::label`]).
//! - Keys are matched case-insensitively after punctuation/dash folding.
//! - Aliases let config files use the names people actually say
//!   ("Financial News", "WallStreetBets", "r/wsb").
//! - Lookup order: alias → exact → `default_weight`.
//!
//! Weights are clamped into `[0.0, 1.0]` on lookup.

use serde::Deserialize;
use std::collections::HashMap;

use crate::record::SourceKind;

/// Weight of a source that is missing from the table.
pub const DEFAULT_SOURCE_WEIGHT: f64 = 0.5;

/// Weight table, usually loaded as the `[weights]` section of the engine config.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceWeightsConfig {
    #[serde(default = "default_default_weight")]
    pub default_weight: f64,
    #[serde(default = "default_weights")]
    pub weights: HashMap<String, f64>,
    #[serde(default = "default_aliases")]
    pub aliases: HashMap<String, String>,
}

fn default_default_weight() -> f64 {
    DEFAULT_SOURCE_WEIGHT
}

fn default_weights() -> HashMap<String, f64> {
    HashMap::from([("news".to_string(), 0.7), ("social".to_string(), 0.3)])
}

fn default_aliases() -> HashMap<String, String> {
    [
        ("financial news", "news"),
        ("institutional", "news"),
        ("alpha vantage", "news"),
        ("newsapi", "news"),
        ("wallstreetbets", "social"),
        ("wsb", "social"),
        ("r wallstreetbets", "social"),
        ("r wsb", "social"),
        ("reddit", "social"),
    ]
    .into_iter()
    .map(|(a, c)| (a.to_string(), c.to_string()))
    .collect()
}

impl Default for SourceWeightsConfig {
    /// NEWS 0.7, SOCIAL 0.3, anything else 0.5.
    fn default() -> Self {
        Self {
            default_weight: DEFAULT_SOURCE_WEIGHT,
            weights: default_weights(),
            aliases: default_aliases(),
        }
    }
}

impl SourceWeightsConfig {
    /// Weight for a source category.
    pub fn weight_for_kind(&self, kind: SourceKind) -> f64 {
        self.weight_for(kind.label())
    }

    /// Weight for a free-form source name.
    pub fn weight_for(&self, source: &str) -> f64 {
        let key = normalize(source);

        if let Some(canon) = self.lookup_alias(&key) {
            if let Some(w) = self.lookup_weight(&normalize(canon)) {
                return clamp01(w);
            }
        }

        if let Some(w) = self.lookup_weight(&key) {
            return clamp01(w);
        }

        clamp01(self.default_weight)
    }

    /// Table keys may be written in any case in config files, so compare normalized.
    fn lookup_weight(&self, key: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|(k, _)| normalize(k) == key)
            .map(|(_, &w)| w)
    }

    fn lookup_alias(&self, key: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(k, _)| normalize(k) == key)
            .map(|(_, c)| c.as_str())
    }
}

/// Lowercase, fold dashes/underscores/slashes/punctuation to spaces, collapse runs.
fn normalize(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let folded: String = lowered
        .chars()
        .map(|c| match c {
            '—' | '–' | '-' | '_' | '/' | '\\' | '.' | ',' | '\'' | '’' => ' ',
            c => c,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
