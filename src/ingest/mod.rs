// src/ingest/mod.rs
pub mod adapters;
pub mod fallback;
pub mod normalize;
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::ingest::types::RawItem;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Raw items accepted from providers.");
        describe_counter!(
            "ingest_malformed_total",
            "Items dropped because they failed to parse or normalized to empty text."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Records collapsed by within-source dedup."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors (recovered as empty results)."
        );
        describe_histogram!("ingest_fetch_ms", "Adapter fetch time in milliseconds.");
    });
}

/// Normalize text: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();

    let decoded = html_escape::decode_html_entities(s);

    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    let stripped = re_tags.replace_all(&decoded, " ");

    let quoted = stripped
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&quoted, " ").trim().to_string()
}

/// Canonical ticker: trimmed, `$` cashtag prefix removed, uppercase.
/// Returns `None` unless the result is 1–10 chars of `[A-Z0-9.-]`.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let t = raw.trim().trim_start_matches('$').to_ascii_uppercase();
    let valid = !t.is_empty()
        && t.len() <= 10
        && t.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    valid.then_some(t)
}

/// Common company names for tickers frequently discussed in news.
pub fn company_name(ticker: &str) -> Option<&'static str> {
    match ticker.to_ascii_uppercase().as_str() {
        "AAPL" => Some("Apple"),
        "NVDA" => Some("NVIDIA"),
        "MSFT" => Some("Microsoft"),
        "TSLA" => Some("Tesla"),
        "AMZN" => Some("Amazon"),
        "GOOGL" => Some("Google"),
        "META" => Some("Meta"),
        "NFLX" => Some("Netflix"),
        _ => None,
    }
}

/// Literal, case-insensitive presence check over title + body.
/// Upstream search relevance is not trusted on its own.
#[derive(Debug, Clone)]
pub struct TickerMatcher {
    terms: Vec<String>,
}

impl TickerMatcher {
    /// Matches the symbol only (social posts).
    pub fn symbol(ticker: &str) -> Self {
        Self {
            terms: vec![ticker.to_uppercase()],
        }
    }

    /// Matches the symbol or the company's common name (news articles).
    pub fn symbol_or_company(ticker: &str) -> Self {
        let mut m = Self::symbol(ticker);
        if let Some(name) = company_name(ticker) {
            m.terms.push(name.to_uppercase());
        }
        m
    }

    pub fn matches(&self, item: &RawItem) -> bool {
        let title = item.title.to_uppercase();
        let body = item.body.as_deref().unwrap_or_default().to_uppercase();
        self.terms
            .iter()
            .any(|t| title.contains(t.as_str()) || body.contains(t.as_str()))
    }
}
