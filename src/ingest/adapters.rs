// src/ingest/adapters.rs
//! The two source adapters the engine wires in: social (Reddit search with
//! listing fallback) and news (ordered backend chain).

use async_trait::async_trait;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

use crate::config::engine::{NewsConfig, SocialConfig};
use crate::config::Credentials;
use crate::ingest::fallback::{fetch_with_fallback, FallbackStrategy, SearchListingProvider};
use crate::ingest::providers::alpha_vantage::AlphaVantageClient;
use crate::ingest::providers::news_api::NewsApiClient;
use crate::ingest::providers::reddit::RedditClient;
use crate::ingest::providers::NewsBackend;
use crate::ingest::types::{FetchQuery, RawItem, SourceAdapter};
use crate::ingest::{ensure_metrics_described, TickerMatcher};
use crate::record::SourceKind;

fn record_fetch(adapter: &'static str, started: Instant, items: usize) {
    histogram!("ingest_fetch_ms", "adapter" => adapter).record(started.elapsed().as_secs_f64() * 1_000.0);
    counter!("ingest_items_total", "adapter" => adapter).increment(items as u64);
}

pub struct SocialAdapter {
    provider: Option<Arc<dyn SearchListingProvider>>,
    strategy: FallbackStrategy,
}

impl SocialAdapter {
    pub fn new(provider: Arc<dyn SearchListingProvider>, strategy: FallbackStrategy) -> Self {
        Self {
            provider: Some(provider),
            strategy,
        }
    }

    /// Adapter with no provider behind it; every fetch is empty.
    pub fn unconfigured() -> Self {
        Self {
            provider: None,
            strategy: FallbackStrategy::default(),
        }
    }

    /// Reddit-backed adapter, or an unconfigured one when credentials are missing.
    pub fn reddit(http: reqwest::Client, creds: &Credentials, cfg: &SocialConfig) -> Self {
        let strategy = FallbackStrategy {
            min_target: cfg.min_target,
            limit: cfg.request_limit,
            ..FallbackStrategy::default()
        };
        match creds.reddit.clone() {
            Some(rc) => Self::new(
                Arc::new(RedditClient::new(http, rc, cfg.subreddit.clone())),
                strategy,
            ),
            None => Self {
                provider: None,
                strategy,
            },
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }
}

#[async_trait]
impl SourceAdapter for SocialAdapter {
    async fn fetch(&self, query: &FetchQuery) -> Vec<RawItem> {
        ensure_metrics_described();
        let Some(provider) = self.provider.as_deref() else {
            tracing::warn!(
                target: "ingest",
                adapter = self.name(),
                "social credentials missing; returning no items"
            );
            counter!("ingest_provider_errors_total", "provider" => self.name(), "kind" => "unavailable")
                .increment(1);
            return Vec::new();
        };

        let started = Instant::now();
        let (items, stage) = fetch_with_fallback(provider, query, &self.strategy).await;
        record_fetch(self.name(), started, items.len());
        tracing::info!(
            target: "ingest",
            adapter = self.name(),
            ticker = %query.ticker,
            items = items.len(),
            stage = ?stage,
            "social fetch done"
        );
        items
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }

    fn name(&self) -> &'static str {
        "social"
    }
}

/// Tries each backend in order; the first one that yields relevant,
/// in-window articles wins.
pub struct NewsAdapter {
    backends: Vec<Arc<dyn NewsBackend>>,
}

impl NewsAdapter {
    pub fn new(backends: Vec<Arc<dyn NewsBackend>>) -> Self {
        Self { backends }
    }

    /// Alpha Vantage first, NewsAPI as backup.
    pub fn default_chain(http: reqwest::Client, creds: &Credentials, cfg: &NewsConfig) -> Self {
        Self::new(vec![
            Arc::new(AlphaVantageClient::new(
                http.clone(),
                creds.alpha_vantage_key.clone(),
            )),
            Arc::new(NewsApiClient::new(
                http,
                creds.news_api_key.clone(),
                cfg.page_size,
                cfg.language.clone(),
            )),
        ])
    }
}

#[async_trait]
impl SourceAdapter for NewsAdapter {
    async fn fetch(&self, query: &FetchQuery) -> Vec<RawItem> {
        ensure_metrics_described();
        let started = Instant::now();
        let matcher = TickerMatcher::symbol_or_company(&query.ticker);

        for backend in &self.backends {
            match backend.articles(query).await {
                Ok(articles) => {
                    let returned = articles.len();
                    let relevant: Vec<RawItem> = articles
                        .into_iter()
                        .filter(|a| query.window.contains(a.published_at) && matcher.matches(a))
                        .collect();
                    if !relevant.is_empty() {
                        record_fetch(self.name(), started, relevant.len());
                        tracing::info!(
                            target: "ingest",
                            adapter = self.name(),
                            backend = backend.name(),
                            ticker = %query.ticker,
                            returned,
                            kept = relevant.len(),
                            "news fetch done"
                        );
                        return relevant;
                    }
                    tracing::info!(
                        target: "ingest",
                        backend = backend.name(),
                        returned,
                        "no relevant articles; trying next backend"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        target: "ingest",
                        backend = backend.name(),
                        error = %e,
                        "news backend failed; trying next backend"
                    );
                    counter!("ingest_provider_errors_total", "provider" => backend.name(), "kind" => e.kind())
                        .increment(1);
                }
            }
        }

        record_fetch(self.name(), started, 0);
        tracing::info!(target: "ingest", adapter = self.name(), ticker = %query.ticker, "no news available");
        Vec::new()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::News
    }

    fn name(&self) -> &'static str {
        "news"
    }
}
