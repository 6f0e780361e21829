// src/analyze/scorer.rs
//! Attaches a sentiment triple to every record, in batches.

use metrics::counter;
use std::sync::Arc;

use crate::analyze::classifier::{checked, Classifier};
use crate::config::engine::ScorerConfig;
use crate::error::ClassifierError;
use crate::record::{Record, Sentiment};

/// Keep at most `max_tokens` whitespace-separated tokens.
pub fn truncate_tokens(text: &str, max_tokens: usize) -> String {
    let mut tokens = text.split_whitespace();
    let kept: Vec<&str> = tokens.by_ref().take(max_tokens).collect();
    if tokens.next().is_none() {
        return text.to_string();
    }
    kept.join(" ")
}

pub struct SentimentScorer {
    classifier: Arc<dyn Classifier>,
    batch_size: usize,
    max_tokens: usize,
}

impl SentimentScorer {
    pub fn new(classifier: Arc<dyn Classifier>, cfg: &ScorerConfig) -> Self {
        Self {
            classifier,
            batch_size: cfg.batch_size.max(1),
            max_tokens: cfg.max_tokens.max(1),
        }
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    /// Score every record. Output has the same length and order as the input.
    /// Records that already carry a sentiment pass through untouched; a record
    /// whose classification fails gets the neutral triple.
    pub async fn score(&self, records: Vec<Record>) -> Vec<Record> {
        let total = records.len();
        let mut out = Vec::with_capacity(total);
        let mut failures = 0usize;
        let mut pending = records.into_iter().peekable();

        while pending.peek().is_some() {
            let chunk: Vec<Record> = pending.by_ref().take(self.batch_size).collect();
            let texts: Vec<String> = chunk
                .iter()
                .filter(|r| r.sentiment().is_none())
                .map(|r| truncate_tokens(r.text(), self.max_tokens))
                .collect();
            let mut results = self.classify_chunk(&texts).await.into_iter();

            for record in chunk {
                if record.sentiment().is_some() {
                    out.push(record);
                    continue;
                }
                let result = results
                    .next()
                    .unwrap_or_else(|| Err(ClassifierError::InvalidResponse("missing result".into())));
                let sentiment = match result.and_then(|s| checked(s.positive, s.neutral, s.negative)) {
                    Ok(s) => s,
                    Err(e) => {
                        failures += 1;
                        tracing::debug!(
                            target: "scorer",
                            record = %record.fingerprint(),
                            source = %record.source(),
                            error = %e,
                            "classification failed; using neutral"
                        );
                        Sentiment::NEUTRAL
                    }
                };
                match record.with_sentiment(sentiment) {
                    Ok(r) | Err(r) => out.push(r),
                }
            }
        }

        if failures > 0 {
            counter!("scorer_failures_total", "classifier" => self.classifier.name())
                .increment(failures as u64);
            tracing::warn!(
                target: "scorer",
                classifier = self.classifier.name(),
                failures,
                total,
                "neutral-filled failed classifications"
            );
        }
        out
    }

    /// Classify one batch, padding a short answer with errors so every text
    /// gets exactly one result.
    async fn classify_chunk(&self, texts: &[String]) -> Vec<Result<Sentiment, ClassifierError>> {
        if texts.is_empty() {
            return Vec::new();
        }
        let results = self.classifier.classify_batch(texts).await;
        if results.len() == texts.len() {
            return results;
        }
        tracing::warn!(
            target: "scorer",
            classifier = self.classifier.name(),
            expected = texts.len(),
            got = results.len(),
            "batch length mismatch; discarding batch"
        );
        let err = ClassifierError::InvalidResponse(format!(
            "batch length {} != {}",
            results.len(),
            texts.len()
        ));
        vec![Err(err); texts.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_keeps_budget() {
        assert_eq!(truncate_tokens("a b c d", 2), "a b");
        assert_eq!(truncate_tokens("a  b", 2), "a  b");
        assert_eq!(truncate_tokens("", 5), "");
    }
}
