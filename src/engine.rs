//! # Sentiment Engine
//! Wires adapters, scorer, weight table and result cache into one query:
//! `(ticker, lookback_days)` → `AggregationResult`.
//!
//! Pipeline: both sources fetched concurrently → window check → normalize +
//! within-source dedup → score → merge → weighted index. Source failures only
//! shrink the data; the only errors returned are invalid queries.

use chrono::{NaiveDate, Utc};
use metrics::counter;
use std::sync::Arc;
use std::time::Instant;

use crate::analyze::{
    merge, AggregationResult, Classifier, DataStatus, HttpClassifier, LexiconClassifier,
    SentimentScorer, WeightedScoreCalculator,
};
use crate::cache::ResultCache;
use crate::config::engine::MAX_LOOKBACK_DAYS;
use crate::config::{Credentials, EngineConfig};
use crate::error::EngineError;
use crate::ingest::adapters::{NewsAdapter, SocialAdapter};
use crate::ingest::normalize::normalize_batch;
use crate::ingest::normalize_ticker;
use crate::ingest::types::{FetchQuery, RawItem, SourceAdapter};
use crate::record::Record;
use crate::source_weights::SourceWeightsConfig;

/// `(ticker, lookback_days, calendar day in UTC)`.
pub type CacheKey = (String, u32, NaiveDate);

pub struct SentimentEngine {
    social: Arc<dyn SourceAdapter>,
    news: Arc<dyn SourceAdapter>,
    scorer: SentimentScorer,
    calculator: WeightedScoreCalculator,
    cache: ResultCache<CacheKey, Arc<AggregationResult>>,
    default_lookback: u32,
}

impl SentimentEngine {
    pub fn new(
        social: Arc<dyn SourceAdapter>,
        news: Arc<dyn SourceAdapter>,
        classifier: Arc<dyn Classifier>,
        config: &EngineConfig,
    ) -> Self {
        let config = config.clone().sanitized();
        crate::analyze::ensure_metrics_described();
        Self {
            social,
            news,
            scorer: SentimentScorer::new(classifier, &config.scorer),
            calculator: WeightedScoreCalculator::new(config.weights.clone()),
            cache: ResultCache::new(config.cache.ttl(), config.cache.max_entries),
            default_lookback: config.lookback_days,
        }
    }

    /// Production wiring from environment credentials.
    pub fn from_env(config: &EngineConfig) -> anyhow::Result<Self> {
        Self::from_credentials(config, &Credentials::from_env())
    }

    /// Reddit adapter, Alpha Vantage → NewsAPI chain, and the HTTP classifier
    /// when a service URL is configured (lexicon otherwise).
    pub fn from_credentials(config: &EngineConfig, creds: &Credentials) -> anyhow::Result<Self> {
        let http = config.http.build_client()?;
        let social = SocialAdapter::reddit(http.clone(), creds, &config.social);
        if !social.is_configured() {
            tracing::warn!(target: "engine", "reddit credentials missing; social source disabled");
        }
        let news = NewsAdapter::default_chain(http.clone(), creds, &config.news);

        let classifier: Arc<dyn Classifier> = match creds.classifier_url.as_deref() {
            Some(url) => Arc::new(HttpClassifier::new(http, url)),
            None => Arc::new(LexiconClassifier::new()),
        };
        tracing::info!(target: "engine", classifier = classifier.name(), "engine wired");

        Ok(Self::new(Arc::new(social), Arc::new(news), classifier, config))
    }

    pub fn default_lookback(&self) -> u32 {
        self.default_lookback
    }

    pub fn weights(&self) -> &SourceWeightsConfig {
        self.calculator.weights()
    }

    /// Validated, canonical ticker.
    pub fn validate(ticker: &str, lookback_days: u32) -> Result<String, EngineError> {
        let t = normalize_ticker(ticker).ok_or_else(|| EngineError::InvalidTicker(ticker.to_string()))?;
        if !(1..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            return Err(EngineError::InvalidLookback);
        }
        Ok(t)
    }

    /// Cached analysis. Concurrent identical queries share one pipeline run.
    pub async fn analyze(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<Arc<AggregationResult>, EngineError> {
        let ticker = Self::validate(ticker, lookback_days)?;
        let key = (ticker.clone(), lookback_days, Utc::now().date_naive());
        let result = self
            .cache
            .get_or_compute(key, || async { Arc::new(self.run(&ticker, lookback_days).await) })
            .await;
        Ok(result)
    }

    /// Same as [`analyze`](Self::analyze) but always runs the pipeline.
    pub async fn analyze_uncached(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<AggregationResult, EngineError> {
        let ticker = Self::validate(ticker, lookback_days)?;
        Ok(self.run(&ticker, lookback_days).await)
    }

    async fn run(&self, ticker: &str, lookback_days: u32) -> AggregationResult {
        let started = Instant::now();
        let query = FetchQuery::new(ticker, lookback_days, Utc::now());

        let (social_raw, news_raw) = tokio::join!(self.social.fetch(&query), self.news.fetch(&query));

        let social = self.prepare(self.social.as_ref(), social_raw, &query).await;
        let news = self.prepare(self.news.as_ref(), news_raw, &query).await;

        let records = merge(vec![social, news]);
        let result =
            AggregationResult::build(ticker, lookback_days, query.window, records, &self.calculator);

        let status = match result.status() {
            DataStatus::Ok => "ok",
            DataStatus::NoData => "no_data",
        };
        counter!("aggregation_runs_total", "status" => status).increment(1);
        tracing::info!(
            target: "engine",
            ticker,
            lookback_days,
            records = result.records().len(),
            index = result.overall_index(),
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "aggregation done"
        );
        result
    }

    /// Window check, normalize + dedup, score: one source's collection.
    async fn prepare(
        &self,
        adapter: &dyn SourceAdapter,
        raw: Vec<RawItem>,
        query: &FetchQuery,
    ) -> Vec<Record> {
        let fetched = raw.len();
        let in_window: Vec<RawItem> = raw
            .into_iter()
            .filter(|i| query.window.contains(i.published_at))
            .collect();
        let outside = fetched - in_window.len();

        let (records, stats) = normalize_batch(in_window, adapter.kind(), &query.ticker);
        tracing::debug!(
            target: "engine",
            adapter = adapter.name(),
            fetched,
            outside,
            kept = stats.kept,
            malformed = stats.malformed,
            duplicates = stats.duplicates,
            "normalized"
        );
        self.scorer.score(records).await
    }
}
