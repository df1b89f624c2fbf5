use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub type SnapshotId = String;
pub type HypothesisId = String;
pub type Timestamp = f64;

/// One parsed observation of user activity, produced by the external
/// captioning collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationalSnapshot {
    pub id: SnapshotId,
    pub timestamp: Timestamp,
    pub activity_summary: String,
    #[serde(default)]
    pub interaction_goal: Option<String>,
    #[serde(default)]
    pub candidate_labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSource {
    Extracted,
    ExternalSignal,
    UserLocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordKind {
    Extracted,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMemoryItem {
    pub keyword: String,
    pub weight: f64,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    pub sources: Vec<KeywordSource>,
    pub kind: KeywordKind,
    #[serde(default)]
    pub locked_meta: Option<String>,
    pub seq: u64,
}

/// Decaying associative memory of salient keywords. `last_snapshot_id`
/// makes re-application of the same snapshot a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContextMemory {
    pub items: BTreeMap<String, KeywordMemoryItem>,
    pub next_seq: u64,
    #[serde(default)]
    pub last_snapshot_id: Option<SnapshotId>,
}

impl ContextMemory {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisOrigin {
    AiInferred,
    UserConfirmed,
    UserCreated,
}

impl HypothesisOrigin {
    /// User-trusted origins decay slower and are protected from eviction
    /// while healthy.
    pub fn is_trusted(self) -> bool {
        matches!(self, Self::UserConfirmed | Self::UserCreated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisStage {
    Candidate,
    Reinforced,
    Confirmed,
    UserSeeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainTaskHypothesis {
    pub id: HypothesisId,
    pub description: String,
    pub origin: HypothesisOrigin,
    pub stage: HypothesisStage,
    pub weight: f64,
    pub last_reinforced: Timestamp,
    pub contributing_snapshot_ids: BTreeSet<SnapshotId>,
    pub seq: u64,
}

/// Ranked set of competing main-task hypotheses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HypothesisSet {
    pub items: BTreeMap<HypothesisId, MainTaskHypothesis>,
    pub next_seq: u64,
    #[serde(default)]
    pub last_snapshot_id: Option<SnapshotId>,
}

impl HypothesisSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Explicit user override of the hypothesis tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserNudge {
    Confirm { hypothesis_id: HypothesisId },
    NewGoal { text: String },
}

/// One normalized candidate term with its extraction provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedKeyword {
    pub term: String,
    pub importance: f64,
    pub source: KeywordSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedKeyword {
    pub term: String,
    #[serde(default)]
    pub meaning: Option<String>,
}

/// Caller-held tracker state: the two collections every operation reads
/// from and replaces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerState {
    pub memory: ContextMemory,
    pub hypotheses: HypothesisSet,
}

fn default_tick_seconds() -> f64 {
    60.0
}

fn default_decay_half_life_ticks() -> f64 {
    10.0
}

fn default_reinforcement_increment() -> f64 {
    1.0
}

fn default_locked_keyword_boost_factor() -> f64 {
    2.5
}

fn default_memory_capacity() -> usize {
    64
}

fn default_hypothesis_capacity() -> usize {
    8
}

fn default_correlation_threshold() -> f64 {
    0.25
}

fn default_confirm_dominance_boost() -> f64 {
    10.0
}

fn default_new_goal_weight() -> f64 {
    12.0
}

fn default_eviction_epsilon() -> f64 {
    0.05
}

fn default_weight_ceiling() -> f64 {
    20.0
}

fn default_base_weight() -> f64 {
    1.0
}

fn default_retention_window_ticks() -> f64 {
    30.0
}

fn default_locked_retention_factor() -> f64 {
    4.0
}

fn default_locked_half_life_factor() -> f64 {
    4.0
}

fn default_hypothesis_half_life_factor() -> f64 {
    2.0
}

fn default_trusted_half_life_factor() -> f64 {
    3.0
}

fn default_notable_weight() -> f64 {
    2.0
}

fn default_synthesis_weight() -> f64 {
    1.0
}

fn default_max_keywords() -> usize {
    15
}

fn default_min_keyword_len() -> usize {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,
    #[serde(default = "default_decay_half_life_ticks")]
    pub decay_half_life_ticks: f64,
    #[serde(default = "default_reinforcement_increment")]
    pub reinforcement_increment: f64,
    #[serde(default = "default_locked_keyword_boost_factor")]
    pub locked_keyword_boost_factor: f64,
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
    #[serde(default = "default_hypothesis_capacity")]
    pub hypothesis_capacity: usize,
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,
    #[serde(default = "default_confirm_dominance_boost")]
    pub confirm_dominance_boost: f64,
    #[serde(default = "default_new_goal_weight")]
    pub new_goal_weight: f64,
    #[serde(default = "default_eviction_epsilon")]
    pub eviction_epsilon: f64,
    #[serde(default = "default_weight_ceiling")]
    pub weight_ceiling: f64,
    #[serde(default = "default_base_weight")]
    pub base_weight: f64,
    #[serde(default = "default_retention_window_ticks")]
    pub retention_window_ticks: f64,
    #[serde(default = "default_locked_retention_factor")]
    pub locked_retention_factor: f64,
    #[serde(default = "default_locked_half_life_factor")]
    pub locked_half_life_factor: f64,
    #[serde(default = "default_hypothesis_half_life_factor")]
    pub hypothesis_half_life_factor: f64,
    #[serde(default = "default_trusted_half_life_factor")]
    pub trusted_half_life_factor: f64,
    #[serde(default = "default_notable_weight")]
    pub notable_weight: f64,
    #[serde(default = "default_synthesis_weight")]
    pub synthesis_weight: f64,
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
    #[serde(default = "default_min_keyword_len")]
    pub min_keyword_len: usize,
    #[serde(default)]
    pub locked_keywords: Vec<LockedKeyword>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            decay_half_life_ticks: default_decay_half_life_ticks(),
            reinforcement_increment: default_reinforcement_increment(),
            locked_keyword_boost_factor: default_locked_keyword_boost_factor(),
            memory_capacity: default_memory_capacity(),
            hypothesis_capacity: default_hypothesis_capacity(),
            correlation_threshold: default_correlation_threshold(),
            confirm_dominance_boost: default_confirm_dominance_boost(),
            new_goal_weight: default_new_goal_weight(),
            eviction_epsilon: default_eviction_epsilon(),
            weight_ceiling: default_weight_ceiling(),
            base_weight: default_base_weight(),
            retention_window_ticks: default_retention_window_ticks(),
            locked_retention_factor: default_locked_retention_factor(),
            locked_half_life_factor: default_locked_half_life_factor(),
            hypothesis_half_life_factor: default_hypothesis_half_life_factor(),
            trusted_half_life_factor: default_trusted_half_life_factor(),
            notable_weight: default_notable_weight(),
            synthesis_weight: default_synthesis_weight(),
            max_keywords: default_max_keywords(),
            min_keyword_len: default_min_keyword_len(),
            locked_keywords: Vec::new(),
        }
    }
}

pub fn clamp_weight(value: f64, ceiling: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, ceiling.max(0.0))
}

/// Exponential half-life decay multiplier for `elapsed_seconds` of
/// inactivity. `half_life_factor` stretches the configured half-life for
/// slower-decaying item classes.
pub(crate) fn decay_multiplier(
    config: &TrackerConfig,
    elapsed_seconds: f64,
    half_life_factor: f64,
) -> f64 {
    if elapsed_seconds <= 0.0 {
        return 1.0;
    }
    let half_life_ticks = config.decay_half_life_ticks * half_life_factor;
    if half_life_ticks <= 0.0 {
        return 1.0;
    }
    let elapsed_ticks = elapsed_seconds / config.tick_seconds.max(f64::EPSILON);
    0.5_f64.powf(elapsed_ticks / half_life_ticks)
}
