// src/analyze/mod.rs
//! Scoring and reduction: classifier seam, batch scorer, cross-source merge
//! and the weighted index.

pub mod aggregate;
pub mod classifier;
pub mod scorer;
pub mod scoring;

pub use crate::analyze::aggregate::{merge, AggregationResult, DataStatus};
pub use crate::analyze::classifier::{Classifier, HttpClassifier, LexiconClassifier};
pub use crate::analyze::scorer::SentimentScorer;
pub use crate::analyze::scoring::{
    weighted_index, SentimentIndex, SourceBreakdown, WeightedScoreCalculator,
};

use metrics::describe_counter;
use once_cell::sync::OnceCell;

pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "scorer_failures_total",
            "Records neutral-filled after a failed classification."
        );
        describe_counter!("aggregation_runs_total", "Uncached aggregation pipeline runs.");
    });
}
