use crate::{
    continuity::TrackerPersistence,
    tracker::{
        ContextStore, HypothesisTracker, KeywordMemoryItem, MainTaskHypothesis,
        SituationalSnapshot, Timestamp, TrackerConfig, TrackerError, TrackerState, UserNudge,
        error::internal_error, top_n,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOutcome {
    pub snapshot_id: String,
    pub extracted_keywords: usize,
    pub memory_size: usize,
    pub hypothesis_count: usize,
}

/// Owns the tracker collections for one engine process and serializes all
/// mutations through `&mut self`. The core stays pure; this is the only
/// place state is swapped and flushed.
pub struct TrackerSession {
    config: TrackerConfig,
    state: TrackerState,
    persistence: Option<TrackerPersistence>,
}

impl TrackerSession {
    pub fn new(config: TrackerConfig, state: TrackerState) -> Self {
        Self {
            config,
            state,
            persistence: None,
        }
    }

    /// Restores persisted state when present, otherwise starts empty.
    pub fn with_persistence(
        config: TrackerConfig,
        persistence: TrackerPersistence,
    ) -> Result<Self, TrackerError> {
        let state = persistence
            .load()
            .map_err(|err| internal_error(format!("failed to load tracker state: {err}")))?
            .unwrap_or_default();
        tracing::info!(
            target: "session",
            state_path = %persistence.path().display(),
            memory_size = state.memory.len(),
            hypothesis_count = state.hypotheses.len(),
            "tracker_state_loaded"
        );
        Ok(Self {
            config,
            state,
            persistence: Some(persistence),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// One routine tick: memory update then hypothesis update, using the
    /// snapshot's own capture timestamp so replays stay deterministic.
    pub fn observe_snapshot(
        &mut self,
        snapshot: &SituationalSnapshot,
    ) -> Result<SnapshotOutcome, TrackerError> {
        let now = snapshot.timestamp;
        let (memory, extracted) =
            ContextStore::update(&self.config, &self.state.memory, snapshot, now);
        let hypotheses = HypothesisTracker::update(
            &self.config,
            &memory,
            &self.state.hypotheses,
            Some(snapshot),
            None,
            now,
        )?;

        self.state = TrackerState { memory, hypotheses };
        self.persist()?;

        let outcome = SnapshotOutcome {
            snapshot_id: snapshot.id.clone(),
            extracted_keywords: extracted.len(),
            memory_size: self.state.memory.len(),
            hypothesis_count: self.state.hypotheses.len(),
        };
        tracing::info!(
            target: "session",
            snapshot_id = %outcome.snapshot_id,
            extracted_keywords = outcome.extracted_keywords,
            memory_size = outcome.memory_size,
            hypothesis_count = outcome.hypothesis_count,
            "snapshot_processed"
        );
        Ok(outcome)
    }

    /// Applies a user override. On error nothing is mutated or persisted.
    pub fn apply_nudge(&mut self, nudge: &UserNudge, now: Timestamp) -> Result<(), TrackerError> {
        let hypotheses = HypothesisTracker::update(
            &self.config,
            &self.state.memory,
            &self.state.hypotheses,
            None,
            Some(nudge),
            now,
        )?;
        self.state.hypotheses = hypotheses;
        self.persist()?;
        tracing::info!(
            target: "session",
            nudge = ?nudge,
            hypothesis_count = self.state.hypotheses.len(),
            "nudge_applied"
        );
        Ok(())
    }

    pub fn top_memory(&self, n: usize) -> Vec<KeywordMemoryItem> {
        top_n(self.state.memory.items.values(), n)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn top_hypotheses(&self, n: usize) -> Vec<MainTaskHypothesis> {
        top_n(self.state.hypotheses.items.values(), n)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn flush(&self) -> Result<(), TrackerError> {
        self.persist()
    }

    fn persist(&self) -> Result<(), TrackerError> {
        if let Some(persistence) = &self.persistence {
            persistence
                .save(&self.state)
                .map_err(|err| internal_error(format!("failed to persist tracker state: {err}")))?;
        }
        Ok(())
    }
}
