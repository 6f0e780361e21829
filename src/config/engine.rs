// src/config/engine.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::source_weights::SourceWeightsConfig;

pub const ENV_CONFIG_PATH: &str = "SENTIMENT_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/engine.toml";
pub const DEFAULT_JSON_PATH: &str = "config/engine.json";

/// Upper bound on how long an aggregation result may be served from cache.
pub const MAX_CACHE_TTL_SECS: u64 = 3600;

/// Longest trailing window a query may ask for, in days.
pub const MAX_LOOKBACK_DAYS: u32 = 30;

/// Tunables for one engine instance. Every field has a default, so an empty
/// file (or no file) is a valid configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Lookback used when the caller does not pass one.
    pub lookback_days: u32,
    pub social: SocialConfig,
    pub news: NewsConfig,
    pub scorer: ScorerConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub weights: SourceWeightsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            social: SocialConfig::default(),
            news: NewsConfig::default(),
            scorer: ScorerConfig::default(),
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
            weights: SourceWeightsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SocialConfig {
    pub subreddit: String,
    /// Stop widening the search once this many matches were collected.
    pub min_target: usize,
    /// Per-request result limit for search and listing calls.
    pub request_limit: u32,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            subreddit: "wallstreetbets".to_string(),
            min_target: 50,
            request_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewsConfig {
    pub page_size: u32,
    pub language: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScorerConfig {
    pub batch_size: usize,
    /// Whitespace tokens kept per text before classification.
    pub max_tokens: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            max_tokens: 512,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: MAX_CACHE_TTL_SECS,
            max_entries: 10,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 4,
            timeout_secs: 15,
            user_agent: concat!("ticker-sentiment-analyzer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Shared reqwest client for all providers.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("building http client")
    }
}

impl EngineConfig {
    /// Load from an explicit path. Format chosen by extension (`.toml` / `.json`).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: EngineConfig = match ext.as_str() {
            "toml" => toml::from_str(&content).context("parsing engine config toml")?,
            "json" => serde_json::from_str(&content).context("parsing engine config json")?,
            other => return Err(anyhow!("unsupported engine config format: {other:?}")),
        };
        Ok(cfg.sanitized())
    }

    /// Resolution order:
    /// 1) $SENTIMENT_CONFIG_PATH (must exist)
    /// 2) config/engine.toml
    /// 3) config/engine.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Ok(Self::default())
    }

    /// Pull out-of-range values back to something usable.
    pub fn sanitized(mut self) -> Self {
        self.lookback_days = self.lookback_days.clamp(1, MAX_LOOKBACK_DAYS);
        self.social.min_target = self.social.min_target.max(1);
        self.social.request_limit = self.social.request_limit.clamp(1, 100);
        self.news.page_size = self.news.page_size.clamp(1, 100);
        self.scorer.batch_size = self.scorer.batch_size.max(1);
        self.scorer.max_tokens = self.scorer.max_tokens.max(1);
        self.cache.ttl_secs = self.cache.ttl_secs.min(MAX_CACHE_TTL_SECS);
        self.cache.max_entries = self.cache.max_entries.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SourceKind;

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.lookback_days, 7);
        assert_eq!(cfg.social.min_target, 50);
        assert_eq!(cfg.cache.max_entries, 10);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            lookback_days = 3
            [social]
            subreddit = "stocks"
            [weights.weights]
            news = 0.6
            social = 0.4
            "#,
        )
        .unwrap();
        assert_eq!(cfg.lookback_days, 3);
        assert_eq!(cfg.social.subreddit, "stocks");
        assert_eq!(cfg.social.min_target, 50);
        assert!((cfg.weights.weight_for_kind(SourceKind::Social) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn sanitize_caps_ttl_and_floors_zeroes() {
        let cfg: EngineConfig = serde_json::from_str(
            r#"{"lookback_days": 0, "cache": {"ttl_secs": 86400, "max_entries": 0}, "scorer": {"batch_size": 0}}"#,
        )
        .unwrap();
        let cfg = cfg.sanitized();
        assert_eq!(cfg.lookback_days, 1);
        assert_eq!(cfg.cache.ttl_secs, MAX_CACHE_TTL_SECS);
        assert_eq!(cfg.cache.max_entries, 1);
        assert_eq!(cfg.scorer.batch_size, 1);
    }

    #[test]
    fn sanitize_caps_lookback() {
        let cfg: EngineConfig = toml::from_str("lookback_days = 365").unwrap();
        assert_eq!(cfg.sanitized().lookback_days, MAX_LOOKBACK_DAYS);
    }
}
