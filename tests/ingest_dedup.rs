// tests/ingest_dedup.rs
use chrono::{Duration, Utc};

use ticker_sentiment_analyzer::ingest::normalize::normalize_batch;
use ticker_sentiment_analyzer::ingest::types::RawItem;
use ticker_sentiment_analyzer::SourceKind;

#[test]
fn same_url_collapses_to_first_occurrence() {
    let now = Utc::now();
    let raw = vec![
        RawItem::new("TSLA deliveries beat", now).url("https://news.example/tsla"),
        RawItem::new("TSLA deliveries beat (updated)", now + Duration::minutes(5))
            .url("https://news.example/tsla"),
        RawItem::new("TSLA recall", now).url("https://news.example/recall"),
    ];

    let (kept, stats) = normalize_batch(raw, SourceKind::News, "TSLA");
    assert_eq!(kept.len(), 2);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(kept[0].text(), "TSLA deliveries beat");
}

#[test]
fn without_url_identity_is_text_and_timestamp() {
    let now = Utc::now();
    let raw = vec![
        RawItem::new("Same sentence", now),
        RawItem::new("Same sentence", now),
        RawItem::new("Same sentence", now - Duration::hours(1)),
    ];
    let (kept, stats) = normalize_batch(raw, SourceKind::Social, "SPY");
    assert_eq!(kept.len(), 2);
    assert_eq!(stats.duplicates, 1);
}

#[test]
fn dedup_does_not_cross_sources() {
    let now = Utc::now();
    let item = RawItem::new("AAPL up", now).url("https://shared.example/a");
    let (social, _) = normalize_batch(vec![item.clone()], SourceKind::Social, "AAPL");
    let (news, _) = normalize_batch(vec![item], SourceKind::News, "AAPL");
    assert_eq!(social.len() + news.len(), 2);
    assert_ne!(social[0].key(), news[0].key());
}
