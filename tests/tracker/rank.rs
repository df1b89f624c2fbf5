use sightline::tracker::{KeywordKind, KeywordMemoryItem, KeywordSource, top_n};

fn item(keyword: &str, weight: f64, last_seen: f64, seq: u64) -> KeywordMemoryItem {
    KeywordMemoryItem {
        keyword: keyword.to_string(),
        weight,
        first_seen: 0.0,
        last_seen,
        sources: vec![KeywordSource::Extracted],
        kind: KeywordKind::Extracted,
        locked_meta: None,
        seq,
    }
}

#[test]
fn ranks_by_weight_descending() {
    let items = vec![
        item("low", 1.0, 0.0, 0),
        item("high", 3.0, 0.0, 1),
        item("mid", 2.0, 0.0, 2),
    ];

    let ranked = top_n(items.iter(), 3);
    let keywords: Vec<&str> = ranked.iter().map(|i| i.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["high", "mid", "low"]);
}

#[test]
fn breaks_weight_ties_by_recency() {
    let items = vec![
        item("stale", 2.0, 10.0, 0),
        item("fresh", 2.0, 90.0, 1),
    ];

    let ranked = top_n(items.iter(), 2);
    assert_eq!(ranked[0].keyword, "fresh");
    assert_eq!(ranked[1].keyword, "stale");
}

#[test]
fn breaks_full_ties_by_insertion_order() {
    let items = vec![
        item("second", 2.0, 50.0, 7),
        item("first", 2.0, 50.0, 3),
    ];

    let ranked = top_n(items.iter(), 2);
    assert_eq!(ranked[0].keyword, "first");
    assert_eq!(ranked[1].keyword, "second");
}

#[test]
fn truncates_to_requested_size() {
    let items = vec![
        item("a", 3.0, 0.0, 0),
        item("b", 2.0, 0.0, 1),
        item("c", 1.0, 0.0, 2),
    ];

    let ranked = top_n(items.iter(), 2);
    assert_eq!(ranked.len(), 2);
}
