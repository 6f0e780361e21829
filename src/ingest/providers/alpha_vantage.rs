// src/ingest/providers/alpha_vantage.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::FetchError;
use crate::ingest::providers::{read_body, skip_malformed, NewsBackend};
use crate::ingest::types::{FetchQuery, RawItem};

const PROVIDER: &str = "alpha_vantage";
const BASE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Deserialize)]
struct FeedItem {
    title: String,
    url: Option<String>,
    time_published: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

/// `20240105T133000` (the API's compact form). Interpreted as UTC.
fn parse_time_published(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M"))
        .ok()
        .map(|n| n.and_utc())
}

/// Parse a NEWS_SENTIMENT response. Rate-limit and error notices come back as
/// 200 responses without a `feed`, so they map to `SourceUnavailable`.
pub fn parse_feed(body: &str) -> Result<Vec<RawItem>, FetchError> {
    let v: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(PROVIDER, format!("response json: {e}")))?;

    let Some(feed) = v.get("feed").and_then(|f| f.as_array()) else {
        let notice = ["Information", "Note", "Error Message"]
            .iter()
            .find_map(|k| v.get(*k).and_then(|m| m.as_str()));
        return Err(match notice {
            Some(msg) => FetchError::unavailable(PROVIDER, msg.to_string()),
            None => FetchError::malformed(PROVIDER, "response without feed"),
        });
    };

    let mut out = Vec::with_capacity(feed.len());
    for entry in feed {
        let item = match FeedItem::deserialize(entry) {
            Ok(i) => i,
            Err(e) => {
                skip_malformed(PROVIDER, &e.to_string());
                continue;
            }
        };
        let Some(published_at) = parse_time_published(&item.time_published) else {
            skip_malformed(PROVIDER, "bad time_published");
            continue;
        };
        let mut raw = RawItem::new(item.title, published_at);
        raw.body = item.summary;
        raw.url = item.url;
        raw.publisher = item.source;
        out.push(raw);
    }
    Ok(out)
}

pub struct AlphaVantageClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl AlphaVantageClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl NewsBackend for AlphaVantageClient {
    async fn articles(&self, query: &FetchQuery) -> Result<Vec<RawItem>, FetchError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(FetchError::unavailable(PROVIDER, "ALPHA_VANTAGE_KEY not configured"));
        };
        let time_from = query.window.start.format("%Y%m%dT%H%M").to_string();
        let sent = self
            .http
            .get(BASE_URL)
            .query(&[
                ("function", "NEWS_SENTIMENT"),
                ("tickers", query.ticker.as_str()),
                ("time_from", time_from.as_str()),
                ("sort", "LATEST"),
                ("limit", "1000"),
                ("apikey", key),
            ])
            .send()
            .await;
        let body = read_body(PROVIDER, sent).await?;
        parse_feed(&body)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_published_formats() {
        let a = parse_time_published("20240105T133000").unwrap();
        assert_eq!(a.to_rfc3339(), "2024-01-05T13:30:00+00:00");
        assert!(parse_time_published("20240105T1330").is_some());
        assert!(parse_time_published("yesterday").is_none());
    }

    #[test]
    fn rate_limit_notice_is_unavailable() {
        let err = parse_feed(r#"{"Information": "Thank you for using Alpha Vantage! rate limit"}"#)
            .unwrap_err();
        assert!(matches!(err, FetchError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn missing_key_is_unavailable_without_network() {
        let client = AlphaVantageClient::new(reqwest::Client::new(), None);
        let q = FetchQuery::new("AAPL", 7, Utc::now());
        let err = client.articles(&q).await.unwrap_err();
        assert!(matches!(err, FetchError::SourceUnavailable { .. }));
    }
}
