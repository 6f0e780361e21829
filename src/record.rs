// src/record.rs
//! Common record shape shared by every source after normalization.
//!
//! A `Record` is built once by the normalizer and afterwards only gains its
//! sentiment triple through [`Record::with_sentiment`], which consumes the
//! unscored value. There are no setters.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for "sums to 1.0" checks on probability triples.
pub const SENTIMENT_SUM_TOLERANCE: f64 = 1e-3;

/// Source category of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Social,
    News,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Social, SourceKind::News];

    /// Canonical label used in weight tables and logs.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Social => "social",
            SourceKind::News => "news",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Probability triple `(positive, neutral, negative)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sentiment {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

/// Dominant class of a single triple, or bucket of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// Half-width of the neutral band used by [`SentimentLabel::from_index`].
pub const NEUTRAL_BAND: f64 = 0.05;

impl SentimentLabel {
    /// Bucket an index in [-1, 1].
    pub fn from_index(index: f64) -> Self {
        if index > NEUTRAL_BAND {
            SentimentLabel::Positive
        } else if index < -NEUTRAL_BAND {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl Sentiment {
    /// Neutral-dominant triple used when classification fails.
    pub const NEUTRAL: Sentiment = Sentiment {
        positive: 0.0,
        neutral: 1.0,
        negative: 0.0,
    };

    /// Build a triple, rejecting negative/non-finite parts or a sum outside tolerance.
    pub fn new(positive: f64, neutral: f64, negative: f64) -> Option<Self> {
        let parts = [positive, neutral, negative];
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0 + SENTIMENT_SUM_TOLERANCE) {
            return None;
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > SENTIMENT_SUM_TOLERANCE {
            return None;
        }
        Some(Self {
            positive,
            neutral,
            negative,
        })
    }

    /// `positive - negative`, in [-1, 1].
    pub fn net(&self) -> f64 {
        self.positive - self.negative
    }

    /// Argmax over the triple. Ties resolve towards neutral.
    pub fn dominant(&self) -> SentimentLabel {
        if self.neutral >= self.positive && self.neutral >= self.negative {
            SentimentLabel::Neutral
        } else if self.positive >= self.negative {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        }
    }
}

/// Engagement counters carried by social posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub score: i64,
    pub num_comments: i64,
}

/// One observed mention of the ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    text: String,
    timestamp: DateTime<Utc>,
    source: SourceKind,
    ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    engagement: Option<Engagement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sentiment: Option<Sentiment>,
}

/// Identity used for within-source dedup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Url(SourceKind, String),
    Content(SourceKind, String, DateTime<Utc>),
}

impl Record {
    /// Unscored record without provenance. Adapters go through the normalizer.
    pub fn new(
        text: String,
        timestamp: DateTime<Utc>,
        source: SourceKind,
        ticker: String,
    ) -> Self {
        Self {
            text,
            timestamp,
            source,
            ticker,
            origin_url: None,
            publisher: None,
            engagement: None,
            sentiment: None,
        }
    }

    pub fn with_provenance(
        mut self,
        origin_url: Option<String>,
        publisher: Option<String>,
        engagement: Option<Engagement>,
    ) -> Self {
        self.origin_url = origin_url.filter(|u| !u.trim().is_empty());
        self.publisher = publisher.filter(|p| !p.trim().is_empty());
        self.engagement = engagement;
        self
    }

    /// One-time sentiment attachment. Consumes the unscored record; a record
    /// that is already scored comes back unchanged as `Err`.
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Result<Self, Self> {
        if self.sentiment.is_some() {
            return Err(self);
        }
        self.sentiment = Some(sentiment);
        Ok(self)
    }

    /// Projection used by the aggregator to align schemas across sources.
    pub(crate) fn project(mut self, fields: ProvenanceFields) -> Self {
        if !fields.origin_url {
            self.origin_url = None;
        }
        if !fields.publisher {
            self.publisher = None;
        }
        if !fields.engagement {
            self.engagement = None;
        }
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn origin_url(&self) -> Option<&str> {
        self.origin_url.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn engagement(&self) -> Option<Engagement> {
        self.engagement
    }

    pub fn sentiment(&self) -> Option<Sentiment> {
        self.sentiment
    }

    pub fn key(&self) -> RecordKey {
        match &self.origin_url {
            Some(url) => RecordKey::Url(self.source, url.clone()),
            None => RecordKey::Content(self.source, self.text.clone(), self.timestamp),
        }
    }

    /// Which provenance fields this record carries.
    pub(crate) fn provenance_fields(&self) -> ProvenanceFields {
        ProvenanceFields {
            origin_url: self.origin_url.is_some(),
            publisher: self.publisher.is_some(),
            engagement: self.engagement.is_some(),
        }
    }

    /// Short anonymized id for logs (never log raw text).
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.source.label().as_bytes());
        hasher.update(self.text.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

/// Set of optional provenance fields, used for schema reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ProvenanceFields {
    pub origin_url: bool,
    pub publisher: bool,
    pub engagement: bool,
}

impl ProvenanceFields {
    pub const ALL: ProvenanceFields = ProvenanceFields {
        origin_url: true,
        publisher: true,
        engagement: true,
    };

    pub fn union(self, other: Self) -> Self {
        Self {
            origin_url: self.origin_url || other.origin_url,
            publisher: self.publisher || other.publisher,
            engagement: self.engagement || other.engagement,
        }
    }

    pub fn intersect(self, other: Self) -> Self {
        Self {
            origin_url: self.origin_url && other.origin_url,
            publisher: self.publisher && other.publisher,
            engagement: self.engagement && other.engagement,
        }
    }
}

/// Absolute `[start, end]` window, computed once per aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// `[now - lookback_days, now]`, clamped to the earliest representable instant.
    pub fn trailing(now: DateTime<Utc>, lookback_days: u32) -> Self {
        let start = now
            .checked_sub_signed(Duration::days(i64::from(lookback_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end: now }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn sentiment_rejects_bad_triples() {
        assert!(Sentiment::new(0.2, 0.3, 0.5).is_some());
        assert!(Sentiment::new(0.5, 0.5, 0.5).is_none());
        assert!(Sentiment::new(-0.1, 0.6, 0.5).is_none());
        assert!(Sentiment::new(f64::NAN, 0.5, 0.5).is_none());
    }

    #[test]
    fn dominant_prefers_neutral_on_ties() {
        let s = Sentiment::new(0.4, 0.4, 0.2).unwrap();
        assert_eq!(s.dominant(), SentimentLabel::Neutral);
        let p = Sentiment::new(0.7, 0.2, 0.1).unwrap();
        assert_eq!(p.dominant(), SentimentLabel::Positive);
        let n = Sentiment::new(0.1, 0.2, 0.7).unwrap();
        assert_eq!(n.dominant(), SentimentLabel::Negative);
    }

    #[test]
    fn label_from_index_has_neutral_band() {
        assert_eq!(SentimentLabel::from_index(0.04), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_index(-0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_index(0.2), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_index(-0.3), SentimentLabel::Negative);
    }

    #[test]
    fn key_uses_url_when_present() {
        let a = Record::new("x".into(), ts(10), SourceKind::News, "AAPL".into())
            .with_provenance(Some("https://a".into()), None, None);
        let b = Record::new("y".into(), ts(20), SourceKind::News, "AAPL".into())
            .with_provenance(Some("https://a".into()), None, None);
        assert_eq!(a.key(), b.key());

        let c = Record::new("x".into(), ts(10), SourceKind::News, "AAPL".into());
        let d = Record::new("x".into(), ts(11), SourceKind::News, "AAPL".into());
        assert_ne!(c.key(), d.key());
    }

    #[test]
    fn blank_provenance_is_dropped() {
        let r = Record::new("x".into(), ts(1), SourceKind::Social, "TSLA".into())
            .with_provenance(Some("  ".into()), Some(String::new()), None);
        assert_eq!(r.origin_url(), None);
        assert_eq!(r.publisher(), None);
    }

    #[test]
    fn window_is_inclusive() {
        let now = ts(100 * 86_400);
        let w = TimeWindow::trailing(now, 7);
        assert!(w.contains(now));
        assert!(w.contains(now - Duration::days(7)));
        assert!(!w.contains(now - Duration::days(7) - Duration::seconds(1)));
        assert!(!w.contains(now + Duration::seconds(1)));
    }

    #[test]
    fn huge_window_clamps_instead_of_overflowing() {
        let now = ts(100 * 86_400);
        let w = TimeWindow::trailing(now, u32::MAX);
        assert_eq!(w.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(w.end, now);
        assert!(w.contains(ts(0)));
    }

    #[test]
    fn sentiment_attaches_only_once() {
        let first = Sentiment::new(0.6, 0.3, 0.1).unwrap();
        let second = Sentiment::new(0.1, 0.3, 0.6).unwrap();
        let scored = Record::new("x".into(), ts(1), SourceKind::News, "AAPL".into())
            .with_sentiment(first)
            .unwrap();

        let rejected = scored.with_sentiment(second).unwrap_err();
        assert_eq!(rejected.sentiment(), Some(first));
    }
}
