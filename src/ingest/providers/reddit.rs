// src/ingest/providers/reddit.rs
//! Reddit API client (application-only OAuth) for one subreddit.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::RedditCredentials;
use crate::error::FetchError;
use crate::ingest::fallback::{Listing, SearchListingProvider, TimeFilter};
use crate::ingest::providers::{read_body, skip_malformed};
use crate::ingest::types::RawItem;

const PROVIDER: &str = "reddit";
const AUTH_BASE: &str = "https://www.reddit.com";
const API_BASE: &str = "https://oauth.reddit.com";
const PERMALINK_BASE: &str = "https://www.reddit.com";

/// Refresh the token this long before Reddit says it expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    selftext: String,
    created_utc: f64,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
    permalink: String,
}

/// Parse a Reddit listing (`/search`, `/hot`, `/new`, `/top` share the shape).
/// Children that fail to parse are skipped and counted.
pub fn parse_listing(body: &str) -> Result<Vec<RawItem>, FetchError> {
    let envelope: ListingEnvelope = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(PROVIDER, format!("listing envelope: {e}")))?;

    let mut out = Vec::with_capacity(envelope.data.children.len());
    for child in envelope.data.children {
        let post = match serde_json::from_value::<Child>(child) {
            Ok(c) => c.data,
            Err(e) => {
                skip_malformed(PROVIDER, &e.to_string());
                continue;
            }
        };
        let Some(published_at) = Utc.timestamp_opt(post.created_utc as i64, 0).single() else {
            skip_malformed(PROVIDER, "created_utc out of range");
            continue;
        };
        let mut item = RawItem::new(post.title, published_at)
            .url(format!("{PERMALINK_BASE}{}", post.permalink))
            .engagement(post.score, post.num_comments);
        if !post.selftext.is_empty() {
            item = item.body(post.selftext);
        }
        out.push(item);
    }
    Ok(out)
}

pub struct RedditClient {
    http: reqwest::Client,
    creds: RedditCredentials,
    subreddit: String,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(http: reqwest::Client, creds: RedditCredentials, subreddit: impl Into<String>) -> Self {
        Self {
            http,
            creds,
            subreddit: subreddit.into(),
            token: Mutex::new(None),
        }
    }

    pub fn subreddit(&self) -> &str {
        &self.subreddit
    }

    /// Cached bearer token; fetches a new one when missing or about to expire.
    async fn bearer(&self) -> Result<String, FetchError> {
        let mut guard = self.token.lock().await;
        if let Some(tok) = guard.as_ref() {
            if Instant::now() < tok.expires_at {
                return Ok(tok.value.clone());
            }
        }

        let sent = self
            .http
            .post(format!("{AUTH_BASE}/api/v1/access_token"))
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .header(reqwest::header::USER_AGENT, &self.creds.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await;
        let body = read_body(PROVIDER, sent).await?;
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::unavailable(PROVIDER, format!("token response: {e}")))?;

        let ttl = Duration::from_secs(parsed.expires_in).saturating_sub(TOKEN_SLACK);
        let value = parsed.access_token;
        *guard = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
        });
        tracing::debug!(target: "ingest", provider = PROVIDER, "obtained access token");
        Ok(value)
    }

    async fn get_listing(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<RawItem>, FetchError> {
        let token = self.bearer().await?;
        let sent = self
            .http
            .get(format!("{API_BASE}/r/{}/{path}", self.subreddit))
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &self.creds.user_agent)
            .query(params)
            .send()
            .await;
        let body = read_body(PROVIDER, sent).await?;
        parse_listing(&body)
    }
}

#[async_trait]
impl SearchListingProvider for RedditClient {
    async fn search(
        &self,
        query: &str,
        filter: TimeFilter,
        limit: u32,
    ) -> Result<Vec<RawItem>, FetchError> {
        let params = [
            ("q", query.to_string()),
            ("restrict_sr", "1".to_string()),
            ("sort", "relevance".to_string()),
            ("t", filter.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        self.get_listing("search", &params).await
    }

    async fn listing(&self, listing: Listing, limit: u32) -> Result<Vec<RawItem>, FetchError> {
        let limit = ("limit", limit.to_string());
        match listing {
            Listing::Hot => self.get_listing("hot", &[limit]).await,
            Listing::New => self.get_listing("new", &[limit]).await,
            Listing::Top(t) => {
                self.get_listing("top", &[limit, ("t", t.as_str().to_string())])
                    .await
            }
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
