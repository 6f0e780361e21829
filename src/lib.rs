// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod record;
pub mod source_weights;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{weighted_index, AggregationResult, DataStatus, WeightedScoreCalculator};
pub use crate::api::router;
pub use crate::config::EngineConfig;
pub use crate::engine::SentimentEngine;
pub use crate::error::{ClassifierError, EngineError, FetchError};
pub use crate::record::{Record, Sentiment, SentimentLabel, SourceKind};
