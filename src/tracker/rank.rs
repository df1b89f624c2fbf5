use std::cmp::Ordering;

use crate::tracker::types::{KeywordMemoryItem, MainTaskHypothesis, Timestamp};

/// Anything that can be ranked: weight descending, then most recent, then
/// stable insertion order. One ordering shared by memory items and
/// hypotheses.
pub trait Ranked {
    fn rank_weight(&self) -> f64;
    fn rank_recency(&self) -> Timestamp;
    fn rank_seq(&self) -> u64;
}

impl Ranked for KeywordMemoryItem {
    fn rank_weight(&self) -> f64 {
        self.weight
    }

    fn rank_recency(&self) -> Timestamp {
        self.last_seen
    }

    fn rank_seq(&self) -> u64 {
        self.seq
    }
}

impl Ranked for MainTaskHypothesis {
    fn rank_weight(&self) -> f64 {
        self.weight
    }

    fn rank_recency(&self) -> Timestamp {
        self.last_reinforced
    }

    fn rank_seq(&self) -> u64 {
        self.seq
    }
}

pub fn rank_ordering<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.rank_weight()
        .partial_cmp(&a.rank_weight())
        .unwrap_or(Ordering::Equal)
        .then(
            b.rank_recency()
                .partial_cmp(&a.rank_recency())
                .unwrap_or(Ordering::Equal),
        )
        .then(a.rank_seq().cmp(&b.rank_seq()))
}

/// Read-only ranked view over a collection.
pub fn top_n<'a, T, I>(items: I, n: usize) -> Vec<&'a T>
where
    T: Ranked,
    I: IntoIterator<Item = &'a T>,
{
    let mut ranked: Vec<&T> = items.into_iter().collect();
    ranked.sort_by(|a, b| rank_ordering(*a, *b));
    ranked.truncate(n);
    ranked
}
