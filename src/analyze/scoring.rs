//! Weighted cross-source index.
//!
//! Per source: `net = mean(positive) - mean(negative)`. Overall:
//! `Σ(net_s · w_s) / Σ(w_s)` over the sources that actually have records, so
//! weights renormalize when a source is missing. Clamped to [-1, 1].

use serde::Serialize;
use std::collections::BTreeMap;

use crate::record::{Record, Sentiment, SourceKind};
use crate::source_weights::SourceWeightsConfig;

/// Per-source summary exposed next to the overall index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceBreakdown {
    pub net: f64,
    pub weight: f64,
    pub record_count: usize,
    pub mean_positive: f64,
    pub mean_neutral: f64,
    pub mean_negative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentIndex {
    pub overall: f64,
    pub per_source: BTreeMap<SourceKind, SourceBreakdown>,
}

#[derive(Default)]
struct Sums {
    positive: f64,
    neutral: f64,
    negative: f64,
    count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct WeightedScoreCalculator {
    weights: SourceWeightsConfig,
}

impl WeightedScoreCalculator {
    pub fn new(weights: SourceWeightsConfig) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &SourceWeightsConfig {
        &self.weights
    }

    /// Breakdown for every source present in `records`. Unscored records count
    /// as neutral.
    pub fn per_source(&self, records: &[Record]) -> BTreeMap<SourceKind, SourceBreakdown> {
        let mut sums: BTreeMap<SourceKind, Sums> = BTreeMap::new();
        for r in records {
            let s = r.sentiment().unwrap_or(Sentiment::NEUTRAL);
            let e = sums.entry(r.source()).or_default();
            e.positive += s.positive;
            e.neutral += s.neutral;
            e.negative += s.negative;
            e.count += 1;
        }

        sums.into_iter()
            .map(|(kind, s)| {
                let n = s.count as f64;
                let (p, u, g) = (s.positive / n, s.neutral / n, s.negative / n);
                let b = SourceBreakdown {
                    net: p - g,
                    weight: self.weights.weight_for_kind(kind),
                    record_count: s.count,
                    mean_positive: p,
                    mean_neutral: u,
                    mean_negative: g,
                };
                (kind, b)
            })
            .collect()
    }

    pub fn net_by_source(&self, records: &[Record]) -> BTreeMap<SourceKind, f64> {
        self.per_source(records)
            .into_iter()
            .map(|(k, b)| (k, b.net))
            .collect()
    }

    pub fn compute(&self, records: &[Record]) -> SentimentIndex {
        let per_source = self.per_source(records);
        let overall = combine(&per_source);
        SentimentIndex {
            overall,
            per_source,
        }
    }

    pub fn weighted_index(&self, records: &[Record]) -> f64 {
        self.compute(records).overall
    }
}

fn combine(per_source: &BTreeMap<SourceKind, SourceBreakdown>) -> f64 {
    let (num, denom) = per_source
        .values()
        .fold((0.0, 0.0), |(num, denom), b| (num + b.net * b.weight, denom + b.weight));
    if denom <= 0.0 {
        return 0.0;
    }
    let v = num / denom;
    if v.is_finite() {
        v.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Index under the default weight table (news 0.7, social 0.3).
pub fn weighted_index(records: &[Record]) -> f64 {
    WeightedScoreCalculator::default().weighted_index(records)
}
