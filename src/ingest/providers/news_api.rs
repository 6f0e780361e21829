// src/ingest/providers/news_api.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::FetchError;
use crate::ingest::company_name;
use crate::ingest::providers::{read_body, skip_malformed, NewsBackend};
use crate::ingest::types::{FetchQuery, RawItem};

const PROVIDER: &str = "news_api";
const BASE_URL: &str = "https://newsapi.org/v2/everything";

/// NewsAPI replaces takedowns with this marker instead of dropping them.
const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    source: Option<ArticleSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `AAPL OR Apple` when the company name is known, else the bare symbol.
pub fn search_terms(ticker: &str) -> String {
    match company_name(ticker) {
        Some(name) => format!("{ticker} OR {name}"),
        None => ticker.to_string(),
    }
}

pub fn parse_everything(body: &str) -> Result<Vec<RawItem>, FetchError> {
    let env: Envelope = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(PROVIDER, format!("response json: {e}")))?;
    if env.status != "ok" {
        return Err(FetchError::unavailable(
            PROVIDER,
            env.message.unwrap_or_else(|| format!("status {}", env.status)),
        ));
    }

    let mut out = Vec::with_capacity(env.articles.len());
    for entry in env.articles {
        let article = match serde_json::from_value::<Article>(entry) {
            Ok(a) => a,
            Err(e) => {
                skip_malformed(PROVIDER, &e.to_string());
                continue;
            }
        };
        let title = article.title.unwrap_or_default();
        if title.trim().is_empty() || title == REMOVED_MARKER {
            skip_malformed(PROVIDER, "removed or untitled article");
            continue;
        }
        let Some(published_at) = parse_rfc3339(&article.published_at) else {
            skip_malformed(PROVIDER, "bad publishedAt");
            continue;
        };
        let mut raw = RawItem::new(title, published_at);
        raw.body = article.description;
        raw.url = article.url;
        raw.publisher = article.source.and_then(|s| s.name);
        out.push(raw);
    }
    Ok(out)
}

pub struct NewsApiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    page_size: u32,
    language: String,
}

impl NewsApiClient {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
        page_size: u32,
        language: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key,
            page_size,
            language: language.into(),
        }
    }
}

#[async_trait]
impl NewsBackend for NewsApiClient {
    async fn articles(&self, query: &FetchQuery) -> Result<Vec<RawItem>, FetchError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(FetchError::unavailable(PROVIDER, "NEWS_API_KEY not configured"));
        };
        let sent = self
            .http
            .get(BASE_URL)
            .header("X-Api-Key", key)
            .query(&[
                ("q", search_terms(&query.ticker)),
                ("from", query.window.start.format("%Y-%m-%d").to_string()),
                ("to", query.window.end.format("%Y-%m-%d").to_string()),
                ("language", self.language.clone()),
                ("sortBy", "publishedAt".to_string()),
                ("pageSize", self.page_size.to_string()),
            ])
            .send()
            .await;
        let body = read_body(PROVIDER, sent).await?;
        parse_everything(&body)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_includes_company_name() {
        assert_eq!(search_terms("NVDA"), "NVDA OR NVIDIA");
        assert_eq!(search_terms("PLTR"), "PLTR");
    }

    #[test]
    fn error_status_is_unavailable() {
        let err = parse_everything(
            r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            FetchError::unavailable(PROVIDER, "Your API key is invalid")
        );
    }

    #[test]
    fn rfc3339_with_offset() {
        let t = parse_rfc3339("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-03-01T08:00:00+00:00");
    }
}
