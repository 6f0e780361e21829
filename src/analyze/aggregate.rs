// src/analyze/aggregate.rs
//! Cross-source merge and the materialized result of one query.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyze::scoring::{SourceBreakdown, WeightedScoreCalculator};
use crate::record::{ProvenanceFields, Record, SentimentLabel, SourceKind, TimeWindow};

/// Fields every non-empty collection carries on at least one record.
fn common_fields(collections: &[Vec<Record>]) -> ProvenanceFields {
    collections
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| {
            c.iter()
                .fold(ProvenanceFields::default(), |acc, r| acc.union(r.provenance_fields()))
        })
        .fold(ProvenanceFields::ALL, ProvenanceFields::intersect)
}

/// Concatenate per-source collections and align their schemas. No
/// cross-source dedup; all-empty input yields an empty vector.
pub fn merge(collections: Vec<Vec<Record>>) -> Vec<Record> {
    let common = common_fields(&collections);
    collections
        .into_iter()
        .flatten()
        .map(|r| r.project(common))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    Ok,
    NoData,
}

/// Output of one `(ticker, lookback)` query. Read-only after `build`.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    ticker: String,
    lookback_days: u32,
    window: TimeWindow,
    generated_at: DateTime<Utc>,
    status: DataStatus,
    overall_index: f64,
    overall_label: SentimentLabel,
    per_source: BTreeMap<SourceKind, SourceBreakdown>,
    records: Vec<Record>,
}

impl AggregationResult {
    pub fn build(
        ticker: impl Into<String>,
        lookback_days: u32,
        window: TimeWindow,
        records: Vec<Record>,
        calculator: &WeightedScoreCalculator,
    ) -> Self {
        let index = calculator.compute(&records);
        let status = if records.is_empty() {
            DataStatus::NoData
        } else {
            DataStatus::Ok
        };
        Self {
            ticker: ticker.into(),
            lookback_days,
            window,
            generated_at: Utc::now(),
            status,
            overall_index: index.overall,
            overall_label: SentimentLabel::from_index(index.overall),
            per_source: index.per_source,
            records,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn status(&self) -> DataStatus {
        self.status
    }

    pub fn overall_index(&self) -> f64 {
        self.overall_index
    }

    pub fn overall_label(&self) -> SentimentLabel {
        self.overall_label
    }

    pub fn per_source(&self) -> &BTreeMap<SourceKind, SourceBreakdown> {
        &self.per_source
    }

    pub fn net_for(&self, kind: SourceKind) -> Option<f64> {
        self.per_source.get(&kind).map(|b| b.net)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}
