use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use crate::tracker::{
    error::{TrackerError, empty_goal, invalid_reference},
    extractor::normalize_terms,
    nudge::NudgeProcessor,
    rank,
    types::{
        ContextMemory, HypothesisId, HypothesisOrigin, HypothesisSet, HypothesisStage,
        MainTaskHypothesis, SituationalSnapshot, Timestamp, TrackerConfig, UserNudge,
        clamp_weight, decay_multiplier,
    },
};

const CONFIRM_RIVAL_PENALTY: f64 = 0.5;
const DOMINANCE_MARGIN: f64 = 0.9;
const TOP_MEMORY_FOR_CORRELATION: usize = 10;
const MAX_CONTRIBUTING_SNAPSHOTS: usize = 64;

pub struct HypothesisTracker;

impl HypothesisTracker {
    /// One hypothesis cycle. A nudge short-circuits correlation and goes
    /// through the NudgeProcessor; otherwise a routine snapshot tick runs.
    /// Pure function of its inputs; errors leave state untouched.
    pub fn update(
        config: &TrackerConfig,
        memory: &ContextMemory,
        previous: &HypothesisSet,
        snapshot: Option<&SituationalSnapshot>,
        nudge: Option<&UserNudge>,
        now: Timestamp,
    ) -> Result<HypothesisSet, TrackerError> {
        if let Some(nudge) = nudge {
            return NudgeProcessor::apply(config, previous, nudge, now);
        }
        match snapshot {
            Some(snapshot) => Ok(Self::tick(config, memory, previous, snapshot, now)),
            None => Ok(previous.clone()),
        }
    }

    /// User confirmation: promote the hypothesis, boost it above every
    /// rival, and penalize the rest so the confirmed entry is guaranteed
    /// top rank.
    pub(crate) fn confirm(
        config: &TrackerConfig,
        previous: &HypothesisSet,
        hypothesis_id: &str,
        now: Timestamp,
    ) -> Result<HypothesisSet, TrackerError> {
        let mut set = previous.clone();
        let confirmed_weight = {
            let item = set.items.get_mut(hypothesis_id).ok_or_else(|| {
                invalid_reference(format!("unknown hypothesis '{hypothesis_id}'"))
            })?;
            item.origin = HypothesisOrigin::UserConfirmed;
            item.stage = HypothesisStage::Confirmed;
            item.weight = clamp_weight(
                item.weight + config.confirm_dominance_boost,
                config.weight_ceiling,
            );
            item.last_reinforced = now;
            item.weight
        };

        let cap = confirmed_weight * DOMINANCE_MARGIN;
        for (id, item) in set.items.iter_mut() {
            if id != hypothesis_id {
                item.weight = clamp_weight(
                    (item.weight * CONFIRM_RIVAL_PENALTY).min(cap),
                    config.weight_ceiling,
                );
            }
        }

        Ok(set)
    }

    /// User-seeded goal: insert at a fixed high weight, cap rivals below
    /// it, and evict the weakest entry when at capacity.
    pub(crate) fn seed_goal(
        config: &TrackerConfig,
        previous: &HypothesisSet,
        text: &str,
        now: Timestamp,
    ) -> Result<HypothesisSet, TrackerError> {
        let description = text.trim();
        if description.is_empty() {
            return Err(empty_goal("new goal text cannot be blank"));
        }

        let mut set = previous.clone();
        let id = derive_goal_id(description, now);
        let seq = set.next_seq;
        set.next_seq = set.next_seq.saturating_add(1);
        set.items.insert(
            id.clone(),
            MainTaskHypothesis {
                id: id.clone(),
                description: description.to_string(),
                origin: HypothesisOrigin::UserCreated,
                stage: HypothesisStage::UserSeeded,
                weight: clamp_weight(config.new_goal_weight, config.weight_ceiling),
                last_reinforced: now,
                contributing_snapshot_ids: BTreeSet::new(),
                seq,
            },
        );

        let seeded_weight = set
            .items
            .get(&id)
            .map(|item| item.weight)
            .unwrap_or_default();
        let cap = seeded_weight * DOMINANCE_MARGIN;
        for (other_id, item) in set.items.iter_mut() {
            if *other_id != id {
                item.weight = clamp_weight(item.weight.min(cap), config.weight_ceiling);
            }
        }

        evict(config, &mut set, now);
        Ok(set)
    }

    fn tick(
        config: &TrackerConfig,
        memory: &ContextMemory,
        previous: &HypothesisSet,
        snapshot: &SituationalSnapshot,
        now: Timestamp,
    ) -> HypothesisSet {
        if previous.last_snapshot_id.as_deref() == Some(snapshot.id.as_str()) {
            return previous.clone();
        }

        let mut set = previous.clone();

        for item in set.items.values_mut() {
            let mut half_life_factor = config.hypothesis_half_life_factor;
            if item.origin.is_trusted() {
                half_life_factor *= config.trusted_half_life_factor;
            }
            let multiplier =
                decay_multiplier(config, now - item.last_reinforced, half_life_factor);
            item.weight = clamp_weight(item.weight * multiplier, config.weight_ceiling);
        }

        let signals = correlation_signals(config, memory, snapshot);
        let mut any_correlated = false;
        for item in set.items.values_mut() {
            let score = correlation_score(&item.description, &signals, config.min_keyword_len);
            if score > 0.0 && score >= config.correlation_threshold {
                any_correlated = true;
                item.weight = clamp_weight(
                    item.weight + config.reinforcement_increment * score,
                    config.weight_ceiling,
                );
                item.last_reinforced = now;
                record_contribution(item, &snapshot.id);
                if item.stage == HypothesisStage::Candidate && item.weight >= config.notable_weight
                {
                    item.stage = HypothesisStage::Reinforced;
                }
            }
        }

        if !any_correlated
            && let Some(description) = synthesis_description(snapshot)
            && is_distinct(&set, description, config)
        {
            let seq = set.next_seq;
            set.next_seq = set.next_seq.saturating_add(1);
            let id: HypothesisId = format!("pmt:{}", snapshot.id);
            let mut contributing = BTreeSet::new();
            contributing.insert(snapshot.id.clone());
            set.items.insert(
                id.clone(),
                MainTaskHypothesis {
                    id,
                    description: description.to_string(),
                    origin: HypothesisOrigin::AiInferred,
                    stage: HypothesisStage::Candidate,
                    weight: clamp_weight(config.synthesis_weight, config.weight_ceiling),
                    last_reinforced: now,
                    contributing_snapshot_ids: contributing,
                    seq,
                },
            );
        }

        set.last_snapshot_id = Some(snapshot.id.clone());
        evict(config, &mut set, now);
        set
    }
}

fn correlation_signals(
    config: &TrackerConfig,
    memory: &ContextMemory,
    snapshot: &SituationalSnapshot,
) -> BTreeSet<String> {
    let mut signals: BTreeSet<String> = BTreeSet::new();
    signals.extend(normalize_terms(&snapshot.activity_summary, config.min_keyword_len));
    if let Some(goal) = snapshot.interaction_goal.as_deref() {
        signals.extend(normalize_terms(goal, config.min_keyword_len));
    }
    for label in &snapshot.candidate_labels {
        signals.extend(normalize_terms(label, config.min_keyword_len));
    }
    for item in rank::top_n(memory.items.values(), TOP_MEMORY_FOR_CORRELATION) {
        signals.insert(item.keyword.clone());
    }
    signals
}

/// Containment coefficient: the share of the description's keyword set
/// covered by the observed signals. Descriptions are short, so plain
/// Jaccard would punish a rich signal set.
fn correlation_score(description: &str, signals: &BTreeSet<String>, min_len: usize) -> f64 {
    let tokens: BTreeSet<String> = normalize_terms(description, min_len).into_iter().collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let overlap = tokens.iter().filter(|token| signals.contains(*token)).count();
    overlap as f64 / tokens.len() as f64
}

fn synthesis_description(snapshot: &SituationalSnapshot) -> Option<&str> {
    let goal = snapshot
        .interaction_goal
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());
    goal.or_else(|| {
        let summary = snapshot.activity_summary.trim();
        (!summary.is_empty()).then_some(summary)
    })
}

fn is_distinct(set: &HypothesisSet, description: &str, config: &TrackerConfig) -> bool {
    let tokens: BTreeSet<String> = normalize_terms(description, config.min_keyword_len)
        .into_iter()
        .collect();
    if tokens.is_empty() {
        return false;
    }
    set.items.values().all(|item| {
        correlation_score(&item.description, &tokens, config.min_keyword_len)
            < config.correlation_threshold
    })
}

fn record_contribution(item: &mut MainTaskHypothesis, snapshot_id: &str) {
    item.contributing_snapshot_ids.insert(snapshot_id.to_string());
    while item.contributing_snapshot_ids.len() > MAX_CONTRIBUTING_SNAPSHOTS {
        item.contributing_snapshot_ids.pop_first();
    }
}

/// Deterministic goal id from the text and the nudge time; the core never
/// reads ambient randomness or clocks.
fn derive_goal_id(text: &str, now: Timestamp) -> HypothesisId {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(now.to_bits().to_be_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(6).map(|byte| format!("{byte:02x}")).collect();
    format!("goal:{hex}")
}

/// Floor sweep plus capacity trim, mirroring the memory eviction policy:
/// the most-recently reinforced entry always survives, user-trusted
/// entries are only evictable once decayed below epsilon over the
/// extended horizon, and the capacity bound wins when nothing else is
/// left to evict.
fn evict(config: &TrackerConfig, set: &mut HypothesisSet, now: Timestamp) {
    let Some(protected) = most_recent_id(set) else {
        return;
    };

    let retention_seconds =
        config.retention_window_ticks * config.tick_seconds.max(f64::EPSILON);
    set.items.retain(|id, item| {
        if *id == protected {
            return true;
        }
        if item.weight >= config.eviction_epsilon {
            return true;
        }
        let window = if item.origin.is_trusted() {
            retention_seconds * config.locked_retention_factor
        } else {
            retention_seconds
        };
        now - item.last_reinforced <= window
    });

    let target = config.hypothesis_capacity.max(1);
    while set.items.len() > target {
        let Some(victim) = select_victim(set, &protected, config.eviction_epsilon) else {
            break;
        };
        set.items.remove(&victim);
    }
}

fn most_recent_id(set: &HypothesisSet) -> Option<HypothesisId> {
    set.items
        .values()
        .max_by(|a, b| {
            a.last_reinforced
                .partial_cmp(&b.last_reinforced)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        })
        .map(|item| item.id.clone())
}

fn select_victim(set: &HypothesisSet, protected: &str, epsilon: f64) -> Option<HypothesisId> {
    let weakest = |eligible: &dyn Fn(&MainTaskHypothesis) -> bool| {
        set.items
            .values()
            .filter(|item| item.id != protected && eligible(item))
            .min_by(|a, b| {
                a.weight
                    .partial_cmp(&b.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(
                        a.last_reinforced
                            .partial_cmp(&b.last_reinforced)
                            .unwrap_or(std::cmp::Ordering::Equal),
                    )
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|item| item.id.clone())
    };

    weakest(&|item| !item.origin.is_trusted())
        .or_else(|| weakest(&|item| item.origin.is_trusted() && item.weight < epsilon))
        .or_else(|| weakest(&|_| true))
}
