// src/ingest/fallback.rs
//! Multi-strategy fetch for providers that offer a time-filtered keyword search
//! plus unfiltered listings.
//!
//! 1. Search with widening time filters (day → week → month) until the filters
//!    run out or `min_target` distinct matches were collected.
//! 2. Only keep items that literally mention the ticker and fall inside the
//!    absolute window, whatever the upstream ranking says.
//! 3. If search produced zero matches, scan the listings with the same filters.
//!
//! Every failing call counts as "zero results from this attempt".

use metrics::counter;
use std::collections::HashSet;
use std::fmt;

use crate::error::FetchError;
use crate::ingest::types::{FetchQuery, RawItem};
use crate::ingest::TickerMatcher;

/// Recency filter understood by the provider's search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Day,
    Week,
    Month,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
        }
    }
}

/// Unfiltered listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Hot,
    New,
    Top(TimeFilter),
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listing::Hot => f.write_str("hot"),
            Listing::New => f.write_str("new"),
            Listing::Top(t) => write!(f, "top/{}", t.as_str()),
        }
    }
}

/// A provider that supports both search and listings.
#[async_trait::async_trait]
pub trait SearchListingProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        filter: TimeFilter,
        limit: u32,
    ) -> Result<Vec<RawItem>, FetchError>;

    async fn listing(&self, listing: Listing, limit: u32) -> Result<Vec<RawItem>, FetchError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackStrategy {
    pub time_filters: Vec<TimeFilter>,
    pub listings: Vec<Listing>,
    pub min_target: usize,
    pub limit: u32,
}

impl Default for FallbackStrategy {
    fn default() -> Self {
        Self {
            time_filters: vec![TimeFilter::Day, TimeFilter::Week, TimeFilter::Month],
            listings: vec![Listing::Hot, Listing::New, Listing::Top(TimeFilter::Week)],
            min_target: 50,
            limit: 100,
        }
    }
}

/// Which stage produced the returned items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Search,
    Listings,
    Nothing,
}

/// Collects matches, skipping repeats (by url, else title + instant).
struct Accumulator<'a> {
    matcher: &'a TickerMatcher,
    query: &'a FetchQuery,
    seen: HashSet<String>,
    items: Vec<RawItem>,
}

impl<'a> Accumulator<'a> {
    fn new(matcher: &'a TickerMatcher, query: &'a FetchQuery) -> Self {
        Self {
            matcher,
            query,
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn absorb(&mut self, batch: Vec<RawItem>) -> usize {
        let before = self.items.len();
        for item in batch {
            if !self.query.window.contains(item.published_at) || !self.matcher.matches(&item) {
                continue;
            }
            let key = match &item.url {
                Some(u) => u.clone(),
                None => format!("{}@{}", item.title, item.published_at.timestamp()),
            };
            if self.seen.insert(key) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }
}

/// Run the search → listings fallback against `provider`.
pub async fn fetch_with_fallback<P>(
    provider: &P,
    query: &FetchQuery,
    strategy: &FallbackStrategy,
) -> (Vec<RawItem>, FetchStage)
where
    P: SearchListingProvider + ?Sized,
{
    let matcher = TickerMatcher::symbol(&query.ticker);
    let mut acc = Accumulator::new(&matcher, query);

    for &filter in &strategy.time_filters {
        match provider.search(&query.ticker, filter, strategy.limit).await {
            Ok(batch) => {
                let added = acc.absorb(batch);
                tracing::debug!(
                    target: "ingest",
                    provider = provider.name(),
                    filter = filter.as_str(),
                    added,
                    total = acc.items.len(),
                    "search attempt"
                );
            }
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    provider = provider.name(),
                    filter = filter.as_str(),
                    error = %e,
                    "search attempt failed; treating as empty"
                );
                counter!("ingest_provider_errors_total", "provider" => provider.name(), "kind" => e.kind())
                    .increment(1);
            }
        }
        if acc.items.len() >= strategy.min_target {
            break;
        }
    }

    if !acc.items.is_empty() {
        return (acc.items, FetchStage::Search);
    }

    tracing::info!(
        target: "ingest",
        provider = provider.name(),
        ticker = %query.ticker,
        "no search matches; falling back to listings"
    );

    for &listing in &strategy.listings {
        match provider.listing(listing, strategy.limit).await {
            Ok(batch) => {
                let added = acc.absorb(batch);
                tracing::debug!(
                    target: "ingest",
                    provider = provider.name(),
                    listing = %listing,
                    added,
                    "listing attempt"
                );
            }
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    provider = provider.name(),
                    listing = %listing,
                    error = %e,
                    "listing attempt failed; treating as empty"
                );
                counter!("ingest_provider_errors_total", "provider" => provider.name(), "kind" => e.kind())
                    .increment(1);
            }
        }
    }

    if acc.items.is_empty() {
        (acc.items, FetchStage::Nothing)
    } else {
        (acc.items, FetchStage::Listings)
    }
}
