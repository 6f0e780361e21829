// src/analyze/classifier.rs
//! Text → sentiment triple. The scorer only sees the `Classifier` trait; the
//! engine decides which implementation to inject.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::record::Sentiment;

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassifierError>;

    /// One result per input, in input order. The default classifies one by one.
    async fn classify_batch(&self, texts: &[String]) -> Vec<Result<Sentiment, ClassifierError>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.classify(text).await);
        }
        out
    }

    fn name(&self) -> &'static str;
}

/// Validate a raw triple coming from outside the crate.
pub fn checked(positive: f64, neutral: f64, negative: f64) -> Result<Sentiment, ClassifierError> {
    Sentiment::new(positive, neutral, negative).ok_or(ClassifierError::InvalidDistribution {
        positive,
        neutral,
        negative,
    })
}

// ---- HTTP (FinBERT-style service) ----

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct Prediction {
    positive: f64,
    neutral: f64,
    negative: f64,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Prediction>,
}

/// Client for a `POST {base}/predict` sentiment service.
#[derive(Clone)]
pub struct HttpClassifier {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClassifier {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn predict(&self, texts: &[String]) -> Result<Vec<Prediction>, ClassifierError> {
        let resp = self
            .http
            .post(format!("{}/predict", self.base_url))
            .json(&PredictRequest { texts })
            .send()
            .await
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ClassifierError::Unavailable(format!("status {}", resp.status())));
        }

        let parsed: PredictResponse = resp
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        if parsed.predictions.len() != texts.len() {
            return Err(ClassifierError::InvalidResponse(format!(
                "expected {} predictions, got {}",
                texts.len(),
                parsed.predictions.len()
            )));
        }
        Ok(parsed.predictions)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassifierError> {
        let texts = [text.to_string()];
        let mut preds = self.predict(&texts).await?;
        let p = preds
            .pop()
            .ok_or_else(|| ClassifierError::InvalidResponse("empty predictions".into()))?;
        checked(p.positive, p.neutral, p.negative)
    }

    /// One request per batch; a failed request fails every item in it.
    async fn classify_batch(&self, texts: &[String]) -> Vec<Result<Sentiment, ClassifierError>> {
        if texts.is_empty() {
            return Vec::new();
        }
        match self.predict(texts).await {
            Ok(preds) => preds
                .into_iter()
                .map(|p| checked(p.positive, p.neutral, p.negative))
                .collect(),
            Err(e) => vec![Err(e); texts.len()],
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// ---- Offline lexicon ----

const POSITIVE: &[&str] = &[
    "beat", "beats", "bull", "bullish", "buy", "climb", "climbs", "gain", "gains", "growth",
    "higher", "jump", "jumps", "moon", "mooning", "outperform", "profit", "profits", "rally",
    "rallies", "record", "rebound", "rise", "rises", "soar", "soars", "strong", "surge",
    "surges", "tendies", "upgrade", "upgraded", "upside", "win", "wins",
];

const NEGATIVE: &[&str] = &[
    "bagholder", "bagholding", "bear", "bearish", "crash", "crashes", "cut", "cuts", "decline",
    "declines", "downgrade", "downgraded", "downside", "drop", "drops", "fall", "falls", "fear",
    "fraud", "lawsuit", "lose", "loss", "losses", "lower", "miss", "misses", "plunge",
    "plunges", "recall", "sell", "selloff", "slump", "tank", "tanks", "weak",
];

fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
            | "don't"
            | "doesn't"
    )
}

/// Deterministic word-list classifier used when no service is configured.
///
/// With `p` positive and `n` negative hits (a negator in the previous three
/// tokens flips a hit), the triple is `(p, 1, n) / (1 + p + n)`. Text with no
/// hits is fully neutral.
#[derive(Debug, Clone, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    /// `(positive hits, negative hits)` after negation.
    pub fn hits(&self, text: &str) -> (u32, u32) {
        let tokens: Vec<String> = tokenize(text).collect();
        let (mut pos, mut neg) = (0u32, 0u32);
        for (i, tok) in tokens.iter().enumerate() {
            let polarity: i8 = if POSITIVE.contains(&tok.as_str()) {
                1
            } else if NEGATIVE.contains(&tok.as_str()) {
                -1
            } else {
                continue;
            };
            let negated = (1..=3).any(|k| i >= k && is_negator(&tokens[i - k]));
            if (polarity > 0) != negated {
                pos += 1;
            } else {
                neg += 1;
            }
        }
        (pos, neg)
    }
}

#[async_trait]
impl Classifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassifierError> {
        let (pos, neg) = self.hits(text);
        let total = 1.0 + f64::from(pos) + f64::from(neg);
        checked(f64::from(pos) / total, 1.0 / total, f64::from(neg) / total)
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}
