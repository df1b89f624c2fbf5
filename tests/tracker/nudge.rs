use sightline::tracker::{
    ContextMemory, HypothesisSet, HypothesisTracker, NudgeProcessor, TrackerErrorKind, UserNudge,
};

use super::{snapshot_with_goal, test_config};

fn seeded_set() -> HypothesisSet {
    let config = test_config();
    HypothesisTracker::update(
        &config,
        &ContextMemory::default(),
        &HypothesisSet::default(),
        Some(&snapshot_with_goal("snap-1", 0.0, "typing", "write launch blog post")),
        None,
        0.0,
    )
    .expect("seeding tick must not fail")
}

#[test]
fn given_confirm_of_unknown_id_when_validated_then_invalid_reference() {
    let set = seeded_set();
    let nudge = UserNudge::Confirm {
        hypothesis_id: "nope".to_string(),
    };

    let err = NudgeProcessor::validate(&nudge, &set).expect_err("must reject unknown id");
    assert_eq!(err.kind, TrackerErrorKind::InvalidReference);
}

#[test]
fn given_whitespace_goal_when_validated_then_empty_goal() {
    let set = HypothesisSet::default();
    let nudge = UserNudge::NewGoal {
        text: "  \t ".to_string(),
    };

    let err = NudgeProcessor::validate(&nudge, &set).expect_err("must reject blank goal");
    assert_eq!(err.kind, TrackerErrorKind::EmptyGoal);
}

#[test]
fn given_failed_apply_then_previous_collection_untouched() {
    let config = test_config();
    let set = seeded_set();
    let before = set.clone();

    let nudge = UserNudge::Confirm {
        hypothesis_id: "nope".to_string(),
    };
    assert!(NudgeProcessor::apply(&config, &set, &nudge, 60.0).is_err());
    assert_eq!(set, before);
}

#[test]
fn given_successful_apply_then_result_is_a_new_collection() {
    let config = test_config();
    let set = seeded_set();
    let before = set.clone();

    let nudge = UserNudge::Confirm {
        hypothesis_id: "pmt:snap-1".to_string(),
    };
    let updated =
        NudgeProcessor::apply(&config, &set, &nudge, 60.0).expect("confirm must succeed");

    assert_eq!(set, before, "input must not be mutated");
    assert_ne!(updated, before);
}
