// tests/providers.rs
//
// Provider response parsers against recorded fixtures.

use ticker_sentiment_analyzer::ingest::normalize::normalize_batch;
use ticker_sentiment_analyzer::ingest::providers::{alpha_vantage, news_api, reddit};
use ticker_sentiment_analyzer::{FetchError, SourceKind};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"))
}

#[test]
fn reddit_listing_fixture() {
    let items = reddit::parse_listing(&fixture("reddit_search.json")).unwrap();
    assert_eq!(items.len(), 2, "post without permalink is skipped");

    let first = &items[0];
    assert_eq!(first.title, "NVDA earnings play &amp; my 0DTE calls");
    assert!(first.body.as_deref().unwrap_or_default().contains("NVDA"));
    assert_eq!(first.score, Some(842));
    assert_eq!(first.num_comments, Some(311));
    assert_eq!(first.published_at.timestamp(), 1_717_000_000);
    assert_eq!(
        first.url.as_deref(),
        Some("https://www.reddit.com/r/wallstreetbets/comments/1d3abc/nvda_earnings_play/")
    );
    assert_eq!(items[1].body, None, "empty selftext is no body");

    let (records, _) = normalize_batch(items, SourceKind::Social, "NVDA");
    assert_eq!(
        records[0].text(),
        "NVDA earnings play & my 0DTE calls Going all in on NVDA before the print."
    );
}

#[test]
fn alpha_vantage_feed_fixture() {
    let items = alpha_vantage::parse_feed(&fixture("alpha_vantage_feed.json")).unwrap();
    assert_eq!(items.len(), 2, "bad time_published is skipped");
    assert_eq!(items[0].publisher.as_deref(), Some("Benzinga"));
    assert_eq!(items[0].published_at.to_rfc3339(), "2024-06-10T18:00:00+00:00");
    assert_eq!(items[1].published_at.to_rfc3339(), "2024-06-11T09:30:00+00:00");
    assert_eq!(items[0].body.as_deref(), Some("Apple shares rose after the keynote."));
}

#[test]
fn alpha_vantage_missing_feed_is_malformed() {
    let err = alpha_vantage::parse_feed(r#"{"items": "0"}"#).unwrap_err();
    assert!(matches!(err, FetchError::MalformedItem { .. }));
}

#[test]
fn news_api_everything_fixture() {
    let items = news_api::parse_everything(&fixture("news_api_everything.json")).unwrap();
    assert_eq!(items.len(), 2, "removed and undated articles are skipped");
    assert_eq!(items[0].title, "Tesla deliveries beat estimates");
    assert_eq!(items[0].publisher.as_deref(), Some("Reuters"));
    assert_eq!(items[1].published_at.to_rfc3339(), "2024-04-03T06:00:00+00:00");
    assert_eq!(items[1].body, None);
}

#[test]
fn news_api_search_terms() {
    assert_eq!(news_api::search_terms("TSLA"), "TSLA OR Tesla");
    assert_eq!(news_api::search_terms("RIVN"), "RIVN");
}
