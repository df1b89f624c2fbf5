use std::collections::BTreeSet;

use crate::tracker::types::{
    ExtractedKeyword, KeywordSource, SituationalSnapshot, TrackerConfig,
};

const INTERACTION_GOAL_IMPORTANCE: f64 = 1.0;
const CANDIDATE_LABEL_IMPORTANCE: f64 = 0.8;
const ACTIVITY_SUMMARY_IMPORTANCE: f64 = 0.6;

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "before", "being", "but", "by", "can", "could", "did", "do", "does", "doing", "down", "for",
    "from", "had", "has", "have", "her", "here", "him", "his", "how", "in", "into", "is", "it",
    "its", "just", "like", "more", "most", "my", "new", "no", "not", "now", "of", "off", "on",
    "one", "only", "or", "other", "our", "out", "over", "own", "per", "she", "should", "so",
    "some", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "through", "to", "under", "until", "up", "using", "very", "via", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "will", "with", "would", "you", "your",
];

pub struct KeywordExtractor;

impl KeywordExtractor {
    /// Turns a snapshot into a deduplicated, normalized, bounded candidate
    /// term list, ordered by source priority then position. Pure; empty
    /// input yields empty output.
    pub fn extract(
        snapshot: &SituationalSnapshot,
        config: &TrackerConfig,
    ) -> Vec<ExtractedKeyword> {
        let mut seen = BTreeSet::new();
        let mut keywords = Vec::new();

        if let Some(goal) = snapshot.interaction_goal.as_deref() {
            push_terms(
                &mut keywords,
                &mut seen,
                goal,
                INTERACTION_GOAL_IMPORTANCE,
                KeywordSource::Extracted,
                config,
            );
        }
        for label in &snapshot.candidate_labels {
            push_terms(
                &mut keywords,
                &mut seen,
                label,
                CANDIDATE_LABEL_IMPORTANCE,
                KeywordSource::ExternalSignal,
                config,
            );
        }
        push_terms(
            &mut keywords,
            &mut seen,
            &snapshot.activity_summary,
            ACTIVITY_SUMMARY_IMPORTANCE,
            KeywordSource::Extracted,
            config,
        );

        keywords.truncate(config.max_keywords);
        keywords
    }
}

fn push_terms(
    keywords: &mut Vec<ExtractedKeyword>,
    seen: &mut BTreeSet<String>,
    text: &str,
    importance: f64,
    source: KeywordSource,
    config: &TrackerConfig,
) {
    for term in normalize_terms(text, config.min_keyword_len) {
        if seen.insert(term.clone()) {
            keywords.push(ExtractedKeyword {
                term,
                importance,
                source,
            });
        }
    }
}

/// Lower-cased alphanumeric tokens, stop-word and length filtered, in
/// order of appearance. Shared with the hypothesis correlation scorer.
pub(crate) fn normalize_terms(text: &str, min_len: usize) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|term| term.len() >= min_len.max(1))
        .filter(|term| !STOP_WORDS.contains(&term.as_str()))
        .collect()
}
