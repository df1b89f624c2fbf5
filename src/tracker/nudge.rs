use crate::tracker::{
    error::{TrackerError, empty_goal, invalid_reference},
    hypothesis::HypothesisTracker,
    types::{HypothesisSet, Timestamp, TrackerConfig, UserNudge},
};

pub struct NudgeProcessor;

impl NudgeProcessor {
    /// Rejects malformed nudges before any state is touched.
    pub fn validate(nudge: &UserNudge, hypotheses: &HypothesisSet) -> Result<(), TrackerError> {
        match nudge {
            UserNudge::Confirm { hypothesis_id } => {
                if !hypotheses.items.contains_key(hypothesis_id) {
                    return Err(invalid_reference(format!(
                        "confirm nudge references unknown hypothesis '{hypothesis_id}'"
                    )));
                }
                Ok(())
            }
            UserNudge::NewGoal { text } => {
                if text.trim().is_empty() {
                    return Err(empty_goal("new goal text cannot be blank"));
                }
                Ok(())
            }
        }
    }

    /// Validates, then delegates to the tracker's nudge branch. On failure
    /// the previous collection is returned untouched to the caller via the
    /// error path.
    pub fn apply(
        config: &TrackerConfig,
        previous: &HypothesisSet,
        nudge: &UserNudge,
        now: Timestamp,
    ) -> Result<HypothesisSet, TrackerError> {
        Self::validate(nudge, previous)?;
        match nudge {
            UserNudge::Confirm { hypothesis_id } => {
                HypothesisTracker::confirm(config, previous, hypothesis_id, now)
            }
            UserNudge::NewGoal { text } => {
                HypothesisTracker::seed_goal(config, previous, text, now)
            }
        }
    }
}
