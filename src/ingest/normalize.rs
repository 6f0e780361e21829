// src/ingest/normalize.rs
//! Raw provider items → common `Record`s, plus within-source dedup.

use metrics::counter;
use std::collections::HashSet;

use crate::ingest::normalize_text;
use crate::ingest::types::RawItem;
use crate::record::{Engagement, Record, SourceKind};

/// Map one raw item onto the common record shape.
///
/// `source` and `ticker` come from the calling context, never from the item.
/// Returns `None` when title and body clean up to nothing; callers drop such
/// items as malformed.
pub fn normalize(item: RawItem, source: SourceKind, ticker: &str) -> Option<Record> {
    let title = normalize_text(&item.title);
    let body = item.body.as_deref().map(normalize_text).unwrap_or_default();

    let text = match (title.is_empty(), body.is_empty()) {
        (true, true) => return None,
        (false, true) => title,
        (true, false) => body,
        (false, false) => format!("{title} {body}"),
    };

    let engagement = match (item.score, item.num_comments) {
        (None, None) => None,
        (score, comments) => Some(Engagement {
            score: score.unwrap_or(0),
            num_comments: comments.unwrap_or(0),
        }),
    };

    Some(
        Record::new(text, item.published_at, source, ticker.to_ascii_uppercase()).with_provenance(
            item.url,
            item.publisher,
            engagement,
        ),
    )
}

/// Counters from one `normalize_batch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub kept: usize,
    pub malformed: usize,
    pub duplicates: usize,
}

/// Normalize a whole source collection and collapse repeats by record key
/// (first occurrence wins). Dedup is scoped to this one collection.
pub fn normalize_batch(
    items: Vec<RawItem>,
    source: SourceKind,
    ticker: &str,
) -> (Vec<Record>, NormalizeStats) {
    let mut stats = NormalizeStats::default();
    let mut seen = HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let Some(record) = normalize(item, source, ticker) else {
            stats.malformed += 1;
            continue;
        };
        if !seen.insert(record.key()) {
            stats.duplicates += 1;
            continue;
        }
        out.push(record);
    }
    stats.kept = out.len();

    counter!("ingest_malformed_total", "source" => source.label()).increment(stats.malformed as u64);
    counter!("ingest_dedup_total", "source" => source.label()).increment(stats.duplicates as u64);

    (out, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn missing_body_becomes_title_only() {
        let r = normalize(RawItem::new("AAPL beats", at(1)), SourceKind::News, "aapl").unwrap();
        assert_eq!(r.text(), "AAPL beats");
        assert_eq!(r.ticker(), "AAPL");
        assert_eq!(r.source(), SourceKind::News);
        assert!(r.sentiment().is_none());
    }

    #[test]
    fn title_and_body_are_joined() {
        let item = RawItem::new("AAPL beats", at(1)).body("<p>Revenue&nbsp;up</p>");
        let r = normalize(item, SourceKind::News, "AAPL").unwrap();
        assert_eq!(r.text(), "AAPL beats Revenue up");
    }

    #[test]
    fn empty_item_is_rejected() {
        let item = RawItem::new("  ", at(1)).body("<br/>");
        assert!(normalize(item, SourceKind::Social, "AAPL").is_none());
    }

    #[test]
    fn engagement_carried_for_social() {
        let item = RawItem::new("GME", at(1)).engagement(420, 69);
        let r = normalize(item, SourceKind::Social, "GME").unwrap();
        assert_eq!(
            r.engagement(),
            Some(Engagement {
                score: 420,
                num_comments: 69
            })
        );
    }

    #[test]
    fn batch_counts_malformed_and_duplicates() {
        let items = vec![
            RawItem::new("TSLA up", at(10)).url("https://r/1"),
            RawItem::new("TSLA up again", at(20)).url("https://r/1"),
            RawItem::new("", at(30)),
            RawItem::new("TSLA flat", at(40)),
            RawItem::new("TSLA flat", at(40)),
            RawItem::new("TSLA flat", at(41)),
        ];
        let (records, stats) = normalize_batch(items, SourceKind::Social, "TSLA");
        assert_eq!(records.len(), 3);
        assert_eq!(
            stats,
            NormalizeStats {
                kept: 3,
                malformed: 1,
                duplicates: 2
            }
        );
        assert_eq!(records[0].text(), "TSLA up");
    }
}
