// src/config/credentials.rs
//! Provider credentials, read from the environment (populated from `.env` by
//! the binary). Blank values and the placeholders shipped in example env files
//! count as missing, so an unconfigured provider degrades to "no data".

use std::fmt;

pub const ENV_REDDIT_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_REDDIT_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_REDDIT_USER_AGENT: &str = "REDDIT_USER_AGENT";
pub const ENV_ALPHA_VANTAGE_KEY: &str = "ALPHA_VANTAGE_KEY";
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const ENV_CLASSIFIER_URL: &str = "ML_SENTIMENT_URL";

const PLACEHOLDERS: &[&str] = &[
    "your_news_api_key",
    "your_alpha_vantage_key",
    "your_client_id",
    "your_client_secret",
    "your_user_agent",
    "changeme",
];

#[derive(Clone, PartialEq, Eq)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

// Keep secrets out of logs.
impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id_len", &self.client_id.len())
            .field("client_secret_len", &self.client_secret.len())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub reddit: Option<RedditCredentials>,
    pub alpha_vantage_key: Option<String>,
    pub news_api_key: Option<String>,
    pub classifier_url: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("reddit", &self.reddit)
            .field("alpha_vantage_key", &self.alpha_vantage_key.is_some())
            .field("news_api_key", &self.news_api_key.is_some())
            .field("classifier_url", &self.classifier_url)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key/value source (env, test maps).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).and_then(present);

        // Reddit needs all three, otherwise the client cannot authenticate.
        let reddit = match (
            get(ENV_REDDIT_CLIENT_ID),
            get(ENV_REDDIT_CLIENT_SECRET),
            get(ENV_REDDIT_USER_AGENT),
        ) {
            (Some(client_id), Some(client_secret), Some(user_agent)) => Some(RedditCredentials {
                client_id,
                client_secret,
                user_agent,
            }),
            _ => None,
        };

        Self {
            reddit,
            alpha_vantage_key: get(ENV_ALPHA_VANTAGE_KEY),
            news_api_key: get(ENV_NEWS_API_KEY),
            classifier_url: get(ENV_CLASSIFIER_URL).map(|u| u.trim_end_matches('/').to_string()),
        }
    }
}

fn present(raw: String) -> Option<String> {
    let v = raw.trim();
    if v.is_empty() || PLACEHOLDERS.iter().any(|p| p.eq_ignore_ascii_case(v)) {
        None
    } else {
        Some(v.to_string())
    }
}
