use sightline::tracker::{
    ContextMemory, HypothesisOrigin, HypothesisSet, HypothesisStage, HypothesisTracker,
    TrackerConfig, TrackerErrorKind, UserNudge, top_n,
};

use super::{snapshot, snapshot_with_goal, test_config};

fn tick(
    config: &TrackerConfig,
    memory: &ContextMemory,
    previous: &HypothesisSet,
    snap: &sightline::tracker::SituationalSnapshot,
) -> HypothesisSet {
    HypothesisTracker::update(config, memory, previous, Some(snap), None, snap.timestamp)
        .expect("routine tick must not fail")
}

#[test]
fn given_no_hypotheses_when_uncorrelated_snapshot_then_candidate_synthesized() {
    let config = test_config();
    let memory = ContextMemory::default();

    let set = tick(
        &config,
        &memory,
        &HypothesisSet::default(),
        &snapshot_with_goal("snap-1", 0.0, "typing in an editor", "write launch blog post"),
    );

    assert_eq!(set.len(), 1);
    let item = set.items.get("pmt:snap-1").expect("synthesized id is derived");
    assert_eq!(item.description, "write launch blog post");
    assert_eq!(item.origin, HypothesisOrigin::AiInferred);
    assert_eq!(item.stage, HypothesisStage::Candidate);
    assert!(item.contributing_snapshot_ids.contains("snap-1"));
}

#[test]
fn given_correlated_snapshot_when_ticked_then_hypothesis_reinforced_not_duplicated() {
    let config = test_config();
    let memory = ContextMemory::default();

    let set = tick(
        &config,
        &memory,
        &HypothesisSet::default(),
        &snapshot_with_goal("snap-1", 0.0, "typing in an editor", "write launch blog post"),
    );
    let start = set.items.get("pmt:snap-1").expect("must exist").weight;

    let set = tick(
        &config,
        &memory,
        &set,
        &snapshot_with_goal("snap-2", 60.0, "still typing the post", "write launch blog post"),
    );

    assert_eq!(set.len(), 1, "correlated snapshot must not synthesize");
    let item = set.items.get("pmt:snap-1").expect("must survive");
    assert!(item.weight > start);
    assert_eq!(item.last_reinforced, 60.0);
    assert!(item.contributing_snapshot_ids.contains("snap-2"));
}

#[test]
fn given_repeated_reinforcement_when_notable_then_candidate_promoted() {
    let config = test_config();
    let memory = ContextMemory::default();
    let mut set = HypothesisSet::default();

    for index in 0..4u32 {
        let now = index as f64 * 60.0;
        set = tick(
            &config,
            &memory,
            &set,
            &snapshot_with_goal(
                &format!("snap-{index}"),
                now,
                "typing in an editor",
                "write launch blog post",
            ),
        );
    }

    let item = set.items.get("pmt:snap-0").expect("must survive");
    assert_eq!(item.stage, HypothesisStage::Reinforced);
}

#[test]
fn given_same_snapshot_when_ticked_twice_then_result_identical() {
    let config = test_config();
    let memory = ContextMemory::default();
    let snap = snapshot_with_goal("snap-1", 0.0, "typing in an editor", "write launch blog post");

    let once = tick(&config, &memory, &HypothesisSet::default(), &snap);
    let twice = tick(&config, &memory, &once, &snap);

    assert_eq!(once, twice);
}

#[test]
fn given_no_snapshot_and_no_nudge_when_updated_then_state_is_returned_unchanged() {
    let config = test_config();
    let memory = ContextMemory::default();

    let set = tick(
        &config,
        &memory,
        &HypothesisSet::default(),
        &snapshot_with_goal("snap-1", 0.0, "typing", "write launch blog post"),
    );
    let result = HypothesisTracker::update(&config, &memory, &set, None, None, 60.0)
        .expect("empty update must not fail");

    assert_eq!(result, set);
}

#[test]
fn given_confirm_nudge_when_applied_then_confirmed_entry_is_top_ranked() {
    let config = test_config();
    let memory = ContextMemory::default();

    let set = tick(
        &config,
        &memory,
        &HypothesisSet::default(),
        &snapshot_with_goal("snap-1", 0.0, "typing", "write launch blog post"),
    );
    let set = tick(
        &config,
        &memory,
        &set,
        &snapshot_with_goal("snap-2", 60.0, "sketching", "design conference poster"),
    );
    // Reinforce the first so the second is clearly behind before the nudge.
    let set = tick(
        &config,
        &memory,
        &set,
        &snapshot_with_goal("snap-3", 120.0, "typing", "write launch blog post"),
    );

    let nudge = UserNudge::Confirm {
        hypothesis_id: "pmt:snap-2".to_string(),
    };
    let set = HypothesisTracker::update(&config, &memory, &set, None, Some(&nudge), 180.0)
        .expect("confirm must succeed");

    let ranked = top_n(set.items.values(), 1);
    assert_eq!(ranked[0].id, "pmt:snap-2");
    assert_eq!(ranked[0].origin, HypothesisOrigin::UserConfirmed);
    assert_eq!(ranked[0].stage, HypothesisStage::Confirmed);
}

#[test]
fn given_confirm_of_unknown_id_then_invalid_reference_and_state_untouched() {
    let config = test_config();
    let memory = ContextMemory::default();

    let set = tick(
        &config,
        &memory,
        &HypothesisSet::default(),
        &snapshot_with_goal("snap-1", 0.0, "typing", "write launch blog post"),
    );
    let before = set.clone();

    let nudge = UserNudge::Confirm {
        hypothesis_id: "unknown-id".to_string(),
    };
    let err = HypothesisTracker::update(&config, &memory, &set, None, Some(&nudge), 60.0)
        .expect_err("unknown id must be rejected");

    assert_eq!(err.kind, TrackerErrorKind::InvalidReference);
    assert_eq!(set, before);
}

#[test]
fn given_new_goal_nudge_when_applied_then_user_created_entry_ranks_first() {
    let config = test_config();
    let memory = ContextMemory::default();

    let set = tick(
        &config,
        &memory,
        &HypothesisSet::default(),
        &snapshot_with_goal("snap-1", 0.0, "typing", "write launch blog post"),
    );

    let nudge = UserNudge::NewGoal {
        text: "Ship v2 release".to_string(),
    };
    let set = HypothesisTracker::update(&config, &memory, &set, None, Some(&nudge), 60.0)
        .expect("new goal must succeed");

    let created = set
        .items
        .values()
        .find(|item| item.description == "Ship v2 release")
        .expect("new goal must be inserted");
    assert_eq!(created.origin, HypothesisOrigin::UserCreated);
    assert_eq!(created.stage, HypothesisStage::UserSeeded);

    let ranked = top_n(set.items.values(), 1);
    assert_eq!(ranked[0].description, "Ship v2 release");
}

#[test]
fn given_blank_new_goal_then_empty_goal_error() {
    let config = test_config();
    let memory = ContextMemory::default();
    let set = HypothesisSet::default();

    let nudge = UserNudge::NewGoal {
        text: "   ".to_string(),
    };
    let err = HypothesisTracker::update(&config, &memory, &set, None, Some(&nudge), 0.0)
        .expect_err("blank goal must be rejected");

    assert_eq!(err.kind, TrackerErrorKind::EmptyGoal);
}

#[test]
fn given_full_set_when_new_goal_applied_then_size_unchanged_and_weakest_evicted() {
    let config = TrackerConfig {
        hypothesis_capacity: 3,
        ..test_config()
    };
    let memory = ContextMemory::default();
    let mut set = HypothesisSet::default();

    let goals = [
        "prepare alpha analysis report",
        "guitar practice session",
        "kitchen renovation budget",
    ];
    for (index, goal) in goals.iter().enumerate() {
        let now = index as f64 * 60.0;
        set = tick(
            &config,
            &memory,
            &set,
            &snapshot_with_goal(&format!("snap-{index}"), now, "busy desktop", goal),
        );
    }
    assert_eq!(set.len(), 3);

    let nudge = UserNudge::NewGoal {
        text: "Ship v2 release".to_string(),
    };
    let set = HypothesisTracker::update(&config, &memory, &set, None, Some(&nudge), 300.0)
        .expect("new goal must succeed");

    assert_eq!(set.len(), 3, "capacity bound must hold after the nudge");
    let ranked = top_n(set.items.values(), 1);
    assert_eq!(ranked[0].description, "Ship v2 release");
}

#[test]
fn given_trusted_and_inferred_entries_when_decaying_then_trusted_decays_slower() {
    let config = test_config();
    let memory = ContextMemory::default();

    let set = tick(
        &config,
        &memory,
        &HypothesisSet::default(),
        &snapshot_with_goal("snap-1", 0.0, "typing", "write launch blog post"),
    );
    let nudge = UserNudge::NewGoal {
        text: "Ship v2 release".to_string(),
    };
    let set = HypothesisTracker::update(&config, &memory, &set, None, Some(&nudge), 0.0)
        .expect("new goal must succeed");

    let inferred_before = set.items.get("pmt:snap-1").expect("must exist").weight;
    let trusted_before = set
        .items
        .values()
        .find(|item| item.origin == HypothesisOrigin::UserCreated)
        .expect("trusted entry must exist")
        .weight;

    let set = tick(
        &config,
        &memory,
        &set,
        &snapshot("snap-2", 600.0, "unrelated zebra browsing"),
    );

    let inferred_ratio = set.items.get("pmt:snap-1").expect("must survive").weight / inferred_before;
    let trusted_ratio = set
        .items
        .values()
        .find(|item| item.origin == HypothesisOrigin::UserCreated)
        .expect("trusted entry must survive")
        .weight
        / trusted_before;

    assert!(
        trusted_ratio > inferred_ratio,
        "trusted entries must decay slower: {trusted_ratio} vs {inferred_ratio}"
    );
}

#[test]
fn given_capacity_bound_when_many_distinct_goals_observed_then_size_holds() {
    let config = TrackerConfig {
        hypothesis_capacity: 2,
        ..test_config()
    };
    let memory = ContextMemory::default();
    let mut set = HypothesisSet::default();

    let goals = [
        "prepare alpha analysis report",
        "guitar practice session",
        "kitchen renovation budget",
        "winter holiday itinerary",
    ];
    for (index, goal) in goals.iter().enumerate() {
        let now = index as f64 * 60.0;
        set = tick(
            &config,
            &memory,
            &set,
            &snapshot_with_goal(&format!("snap-{index}"), now, "busy desktop", goal),
        );
        assert!(set.len() <= 2, "capacity exceeded: {}", set.len());
    }
}
