// tests/engine_e2e.rs
//
// Full pipeline with canned adapters: fetch → normalize → score → merge → index.
mod common;

use chrono::{Duration, Utc};
use std::sync::Arc;

use ticker_sentiment_analyzer::ingest::types::RawItem;
use ticker_sentiment_analyzer::{
    DataStatus, EngineConfig, EngineError, SentimentEngine, SentimentLabel, SourceKind,
};

use common::{hours_ago, KeywordClassifier, StaticAdapter};

fn social_items() -> Vec<RawItem> {
    vec![
        RawItem::new("NVDA going up", hours_ago(2))
            .url("https://reddit.example/1")
            .engagement(100, 20),
        RawItem::new("NVDA going up", hours_ago(2))
            .url("https://reddit.example/1")
            .engagement(100, 20),
        RawItem::new("NVDA down bad", hours_ago(5))
            .url("https://reddit.example/2")
            .engagement(3, 1),
        RawItem::new("NVDA ancient history", Utc::now() - Duration::days(40)),
    ]
}

fn news_items() -> Vec<RawItem> {
    vec![
        RawItem::new("NVIDIA shares up on datacenter demand", hours_ago(1))
            .url("https://news.example/a")
            .publisher("Wire"),
        RawItem::new("NVDA guidance raised", hours_ago(3))
            .body("Analysts see shares up further")
            .url("https://news.example/b")
            .publisher("Wire"),
    ]
}

fn engine(
    social: Vec<RawItem>,
    news: Vec<RawItem>,
) -> (SentimentEngine, Arc<StaticAdapter>, Arc<StaticAdapter>) {
    let s = StaticAdapter::new(SourceKind::Social, social);
    let n = StaticAdapter::new(SourceKind::News, news);
    let engine = SentimentEngine::new(
        s.clone(),
        n.clone(),
        Arc::new(KeywordClassifier),
        &EngineConfig::default(),
    );
    (engine, s, n)
}

#[tokio::test]
async fn pipeline_produces_weighted_result() {
    let (engine, _, _) = engine(social_items(), news_items());
    let r = engine.analyze("$nvda", 7).await.unwrap();

    assert_eq!(r.ticker(), "NVDA");
    assert_eq!(r.status(), DataStatus::Ok);
    // duplicate url collapsed, 40-day-old post dropped by the window
    assert_eq!(r.per_source()[&SourceKind::Social].record_count, 2);
    assert_eq!(r.per_source()[&SourceKind::News].record_count, 2);
    assert_eq!(r.records().len(), 4);
    assert!(r.records().iter().all(|rec| rec.ticker() == "NVDA"));
    assert!(r.records().iter().all(|rec| r.window().contains(rec.timestamp())));

    // social: (0.8,0.1,0.1) and (0.1,0.1,0.8) → net 0.0; news: both up → net 0.7
    let social = r.net_for(SourceKind::Social).unwrap();
    let news = r.net_for(SourceKind::News).unwrap();
    assert!(social.abs() < 1e-9);
    assert!((news - 0.7).abs() < 1e-9);
    assert!((r.overall_index() - 0.49).abs() < 1e-9);
    assert_eq!(r.overall_label(), SentimentLabel::Positive);

    // engagement is social-only and publisher news-only: both projected away
    assert!(r.records().iter().all(|rec| rec.engagement().is_none()));
    assert!(r.records().iter().all(|rec| rec.publisher().is_none()));
}

#[tokio::test]
async fn one_source_down_still_yields_result() {
    let (engine, _, _) = engine(Vec::new(), news_items());
    let r = engine.analyze("NVDA", 7).await.unwrap();
    assert_eq!(r.status(), DataStatus::Ok);
    assert!(r.net_for(SourceKind::Social).is_none());
    assert!((r.overall_index() - 0.7).abs() < 1e-9);
    assert!(r.records().iter().all(|rec| rec.publisher() == Some("Wire")));
}

#[tokio::test]
async fn all_sources_empty_is_no_data() {
    let (engine, _, _) = engine(Vec::new(), Vec::new());
    let r = engine.analyze("NVDA", 7).await.unwrap();
    assert_eq!(r.status(), DataStatus::NoData);
    assert_eq!(r.overall_index(), 0.0);
    assert!(r.records().is_empty());
}

#[tokio::test]
async fn both_adapters_get_the_same_window() {
    let (engine, s, n) = engine(social_items(), news_items());
    engine.analyze("NVDA", 3).await.unwrap();

    let sq = s.calls.lock()[0].clone();
    let nq = n.calls.lock()[0].clone();
    assert_eq!(sq, nq);
    assert_eq!(sq.lookback_days, 3);
    assert_eq!(sq.window.end - sq.window.start, Duration::days(3));
}

#[tokio::test]
async fn repeated_queries_hit_the_cache() {
    let (engine, s, n) = engine(social_items(), news_items());
    let a = engine.analyze("NVDA", 7).await.unwrap();
    let b = engine.analyze("nvda", 7).await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(s.call_count(), 1);
    assert_eq!(n.call_count(), 1);

    engine.analyze("NVDA", 5).await.unwrap();
    assert_eq!(s.call_count(), 2, "different lookback is a different key");
}

#[tokio::test]
async fn concurrent_identical_queries_share_one_run() {
    let (engine, s, _) = engine(social_items(), news_items());
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let e = engine.clone();
        handles.push(tokio::spawn(async move { e.analyze("NVDA", 7).await }));
    }
    for h in handles {
        assert!(h.await.unwrap().is_ok());
    }
    assert_eq!(s.call_count(), 1);
}

#[tokio::test]
async fn invalid_queries_are_rejected_before_fetching() {
    let (engine, s, _) = engine(social_items(), news_items());
    assert_eq!(
        engine.analyze("   ", 7).await.unwrap_err(),
        EngineError::InvalidTicker("   ".into())
    );
    assert_eq!(
        engine.analyze("NVDA", 0).await.unwrap_err(),
        EngineError::InvalidLookback
    );
    assert_eq!(
        engine.analyze("NVDA", u32::MAX).await.unwrap_err(),
        EngineError::InvalidLookback
    );
    assert_eq!(
        engine.analyze_uncached("NVDA", 31).await.unwrap_err(),
        EngineError::InvalidLookback
    );
    assert!(matches!(
        engine.analyze("NV DA!", 7).await,
        Err(EngineError::InvalidTicker(_))
    ));
    assert_eq!(s.call_count(), 0);
}

#[tokio::test]
async fn uncached_analysis_always_fetches() {
    let (engine, s, _) = engine(social_items(), news_items());
    engine.analyze_uncached("NVDA", 7).await.unwrap();
    engine.analyze_uncached("NVDA", 7).await.unwrap();
    assert_eq!(s.call_count(), 2);
}
