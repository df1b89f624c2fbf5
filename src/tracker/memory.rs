use crate::tracker::{
    error::{TrackerError, empty_keyword},
    extractor::KeywordExtractor,
    types::{
        ContextMemory, ExtractedKeyword, KeywordKind, KeywordMemoryItem, KeywordSource,
        LockedKeyword, SituationalSnapshot, Timestamp, TrackerConfig, clamp_weight,
        decay_multiplier,
    },
};

const MAX_SOURCE_TAGS: usize = 16;

pub struct ContextStore;

impl ContextStore {
    /// One processing tick: decay, extract, reinforce/insert, evict.
    /// Deterministic for fixed inputs; returns a new collection and never
    /// mutates `previous`. Re-applying the snapshot already recorded in
    /// `previous.last_snapshot_id` is a no-op.
    pub fn update(
        config: &TrackerConfig,
        previous: &ContextMemory,
        snapshot: &SituationalSnapshot,
        now: Timestamp,
    ) -> (ContextMemory, Vec<ExtractedKeyword>) {
        let extracted = KeywordExtractor::extract(snapshot, config);

        if previous.last_snapshot_id.as_deref() == Some(snapshot.id.as_str()) {
            return (previous.clone(), extracted);
        }

        let mut memory = previous.clone();

        for item in memory.items.values_mut() {
            let half_life_factor = match item.kind {
                KeywordKind::Locked => config.locked_half_life_factor,
                KeywordKind::Extracted => 1.0,
            };
            let multiplier = decay_multiplier(config, now - item.last_seen, half_life_factor);
            item.weight = clamp_weight(item.weight * multiplier, config.weight_ceiling);
        }

        for keyword in &extracted {
            let locked = find_locked(&config.locked_keywords, &keyword.term);
            let mut increment = config.reinforcement_increment * keyword.importance;
            if locked.is_some() {
                increment *= config.locked_keyword_boost_factor;
            }

            match memory.items.get_mut(&keyword.term) {
                Some(item) => {
                    item.weight = clamp_weight(item.weight + increment, config.weight_ceiling);
                    item.last_seen = now;
                    push_source(item, keyword.source);
                }
                None => {
                    let mut base = config.base_weight * keyword.importance;
                    if locked.is_some() {
                        base *= config.locked_keyword_boost_factor;
                    }
                    let seq = memory.next_seq;
                    memory.next_seq = memory.next_seq.saturating_add(1);
                    memory.items.insert(
                        keyword.term.clone(),
                        KeywordMemoryItem {
                            keyword: keyword.term.clone(),
                            weight: clamp_weight(base, config.weight_ceiling),
                            first_seen: now,
                            last_seen: now,
                            sources: vec![keyword.source],
                            kind: KeywordKind::Extracted,
                            locked_meta: None,
                            seq,
                        },
                    );
                }
            }

            if let Some(locked) = locked
                && let Some(item) = memory.items.get_mut(&keyword.term)
            {
                item.kind = KeywordKind::Locked;
                if item.locked_meta.is_none() {
                    item.locked_meta = locked.meaning.clone();
                }
                if !item.sources.contains(&KeywordSource::UserLocked) {
                    push_source(item, KeywordSource::UserLocked);
                }
            }
        }

        memory.last_snapshot_id = Some(snapshot.id.clone());
        evict(config, &mut memory, now);
        (memory, extracted)
    }

    /// Blank locked-keyword terms would match everything; reject them up
    /// front instead of corrupting the memory.
    pub fn validate_locked_keywords(locked: &[LockedKeyword]) -> Result<(), TrackerError> {
        for keyword in locked {
            if keyword.term.trim().is_empty() {
                return Err(empty_keyword("locked keyword term cannot be blank"));
            }
        }
        Ok(())
    }
}

fn find_locked<'a>(locked: &'a [LockedKeyword], term: &str) -> Option<&'a LockedKeyword> {
    locked.iter().find(|candidate| {
        let configured = candidate.term.trim().to_lowercase();
        if configured.is_empty() {
            return false;
        }
        term.contains(&configured) || configured.contains(term)
    })
}

fn push_source(item: &mut KeywordMemoryItem, source: KeywordSource) {
    item.sources.push(source);
    while item.sources.len() > MAX_SOURCE_TAGS {
        item.sources.remove(0);
    }
}

/// Epsilon sweep plus capacity trim. The most-recently reinforced entry is
/// always retained; locked entries are only evictable once decayed below
/// epsilon over the extended retention window, unless the capacity bound
/// leaves no other choice.
fn evict(config: &TrackerConfig, memory: &mut ContextMemory, now: Timestamp) {
    let Some(protected) = most_recent_key(memory) else {
        return;
    };

    let retention_seconds =
        config.retention_window_ticks * config.tick_seconds.max(f64::EPSILON);
    memory.items.retain(|key, item| {
        if *key == protected {
            return true;
        }
        if item.weight >= config.eviction_epsilon {
            return true;
        }
        let window = match item.kind {
            KeywordKind::Locked => retention_seconds * config.locked_retention_factor,
            KeywordKind::Extracted => retention_seconds,
        };
        now - item.last_seen <= window
    });

    let target = config.memory_capacity.max(1);
    while memory.items.len() > target {
        let Some(victim) = select_victim(memory, &protected, config.eviction_epsilon) else {
            break;
        };
        memory.items.remove(&victim);
    }
}

fn most_recent_key(memory: &ContextMemory) -> Option<String> {
    memory
        .items
        .values()
        .max_by(|a, b| {
            a.last_seen
                .partial_cmp(&b.last_seen)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        })
        .map(|item| item.keyword.clone())
}

fn select_victim(memory: &ContextMemory, protected: &str, epsilon: f64) -> Option<String> {
    let weakest = |eligible: &dyn Fn(&KeywordMemoryItem) -> bool| {
        memory
            .items
            .values()
            .filter(|item| item.keyword != protected && eligible(item))
            .min_by(|a, b| {
                a.weight
                    .partial_cmp(&b.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(
                        a.last_seen
                            .partial_cmp(&b.last_seen)
                            .unwrap_or(std::cmp::Ordering::Equal),
                    )
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|item| item.keyword.clone())
    };

    weakest(&|item| item.kind == KeywordKind::Extracted)
        .or_else(|| weakest(&|item| item.kind == KeywordKind::Locked && item.weight < epsilon))
        .or_else(|| weakest(&|_| true))
}
