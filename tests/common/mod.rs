// tests/common/mod.rs
//
// Shared doubles for integration tests: canned adapters and classifiers.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use ticker_sentiment_analyzer::analyze::Classifier;
use ticker_sentiment_analyzer::ingest::types::{FetchQuery, RawItem, SourceAdapter};
use ticker_sentiment_analyzer::{ClassifierError, Sentiment, SourceKind};

pub fn hours_ago(h: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(h)
}

/// Adapter returning a fixed batch and recording every query it saw.
pub struct StaticAdapter {
    kind: SourceKind,
    items: Vec<RawItem>,
    pub calls: Mutex<Vec<FetchQuery>>,
}

impl StaticAdapter {
    pub fn new(kind: SourceKind, items: Vec<RawItem>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            items,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl SourceAdapter for StaticAdapter {
    async fn fetch(&self, query: &FetchQuery) -> Vec<RawItem> {
        self.calls.lock().push(query.clone());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.items.clone()
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        match self.kind {
            SourceKind::Social => "static-social",
            SourceKind::News => "static-news",
        }
    }
}

/// Positive when the text contains "up", negative when it contains "down",
/// neutral otherwise.
pub struct KeywordClassifier;

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassifierError> {
        let t = text.to_lowercase();
        let s = if t.contains("up") {
            Sentiment::new(0.8, 0.1, 0.1)
        } else if t.contains("down") {
            Sentiment::new(0.1, 0.1, 0.8)
        } else {
            Some(Sentiment::NEUTRAL)
        };
        s.ok_or_else(|| ClassifierError::InvalidResponse("bad fixture".into()))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

/// Fails every text containing "fail"; otherwise mildly positive.
/// Records the size of every batch it receives.
pub struct FlakyClassifier {
    pub batches: Mutex<Vec<usize>>,
}

impl FlakyClassifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Classifier for FlakyClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassifierError> {
        if text.contains("fail") {
            return Err(ClassifierError::Unavailable("flaky".into()));
        }
        Sentiment::new(0.6, 0.3, 0.1).ok_or_else(|| ClassifierError::InvalidResponse("x".into()))
    }

    async fn classify_batch(&self, texts: &[String]) -> Vec<Result<Sentiment, ClassifierError>> {
        self.batches.lock().push(texts.len());
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.classify(t).await);
        }
        out
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}
