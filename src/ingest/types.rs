// src/ingest/types.rs
use chrono::{DateTime, Utc};

use crate::record::{SourceKind, TimeWindow};

/// Provider-native item, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawItem {
    pub title: String,
    pub body: Option<String>,
    pub published_at: DateTime<Utc>,
    pub url: Option<String>,
    pub publisher: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
}

impl RawItem {
    pub fn new(title: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            body: None,
            published_at,
            url: None,
            publisher: None,
            score: None,
            num_comments: None,
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn engagement(mut self, score: i64, num_comments: i64) -> Self {
        self.score = Some(score);
        self.num_comments = Some(num_comments);
        self
    }
}

/// One adapter call: ticker, lookback and the absolute window derived from it.
/// The window is computed once per aggregation run so every adapter filters
/// against the same bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    pub ticker: String,
    pub lookback_days: u32,
    pub window: TimeWindow,
}

impl FetchQuery {
    pub fn new(ticker: impl Into<String>, lookback_days: u32, now: DateTime<Utc>) -> Self {
        Self {
            ticker: ticker.into(),
            lookback_days,
            window: TimeWindow::trailing(now, lookback_days),
        }
    }
}

/// One external provider family. `fetch` never fails: every error inside is
/// logged and counted, and the adapter returns whatever it managed to collect.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, query: &FetchQuery) -> Vec<RawItem>;
    fn kind(&self) -> SourceKind;
    fn name(&self) -> &'static str;
}
