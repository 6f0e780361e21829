// src/error.rs
//! Error taxonomy for the aggregation pipeline.
//!
//! Only `EngineError` ever reaches a caller. `FetchError` is swallowed by the
//! adapters (logged + counted) and `ClassifierError` is absorbed by the scorer's
//! neutral-fill policy.

use thiserror::Error;

/// Failures inside a source adapter. Never propagated past the adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Credentials missing/invalid, network failure, non-2xx, provider notice.
    #[error("source unavailable ({provider}): {reason}")]
    SourceUnavailable {
        provider: &'static str,
        reason: String,
    },

    /// A response body (or one item in it) that does not match the expected shape.
    #[error("malformed item ({provider}): {reason}")]
    MalformedItem {
        provider: &'static str,
        reason: String,
    },
}

impl FetchError {
    pub fn unavailable(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            provider,
            reason: reason.into(),
        }
    }

    pub fn malformed(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedItem {
            provider,
            reason: reason.into(),
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "unavailable",
            Self::MalformedItem { .. } => "malformed",
        }
    }
}

/// Per-text classification failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),

    #[error("invalid distribution: ({positive:.4}, {neutral:.4}, {negative:.4})")]
    InvalidDistribution {
        positive: f64,
        neutral: f64,
        negative: f64,
    },
}

/// The only errors `SentimentEngine::analyze` returns: caller mistakes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    #[error("lookback window must be between 1 and {max} days", max = crate::config::engine::MAX_LOOKBACK_DAYS)]
    InvalidLookback,
}
