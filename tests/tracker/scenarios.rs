use sightline::{
    session::TrackerSession,
    tracker::{SituationalSnapshot, TrackerState},
};

use super::test_config;

fn proposal_snapshot(id: &str, timestamp: f64, labels: &[&str]) -> SituationalSnapshot {
    SituationalSnapshot {
        id: id.to_string(),
        timestamp,
        activity_summary: "Editing Project Proposal.docx in Word".to_string(),
        interaction_goal: Some("finalize proposal".to_string()),
        candidate_labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}

/// Three near-identical snapshots 60 s apart converge on "proposal": the
/// repeated keyword outweighs a once-seen one, and the top hypothesis
/// references the proposal goal.
#[test]
fn scenario_repeated_proposal_snapshots_converge() {
    let mut session = TrackerSession::new(test_config(), TrackerState::default());

    session
        .observe_snapshot(&proposal_snapshot("snap-1", 0.0, &["videocall"]))
        .expect("tick 1 must succeed");
    session
        .observe_snapshot(&proposal_snapshot("snap-2", 60.0, &[]))
        .expect("tick 2 must succeed");
    let outcome = session
        .observe_snapshot(&proposal_snapshot("snap-3", 120.0, &[]))
        .expect("tick 3 must succeed");

    assert_eq!(outcome.snapshot_id, "snap-3");

    let state = session.state();
    let proposal = state
        .memory
        .items
        .get("proposal")
        .expect("proposal must be in memory");
    let once_seen = state
        .memory
        .items
        .get("videocall")
        .expect("videocall must be in memory");
    assert!(
        proposal.weight > once_seen.weight,
        "repeated keyword must outweigh a once-seen one: {} vs {}",
        proposal.weight,
        once_seen.weight
    );

    let top = session.top_hypotheses(1);
    assert_eq!(top.len(), 1);
    assert!(
        top[0].description.contains("proposal"),
        "top hypothesis must reference the proposal goal: {}",
        top[0].description
    );
}

/// Capacity bounds hold across a mixed sequence of ticks and nudges.
#[test]
fn scenario_capacity_bounds_hold_across_mixed_operations() {
    let config = sightline::tracker::TrackerConfig {
        memory_capacity: 10,
        hypothesis_capacity: 2,
        ..test_config()
    };
    let mut session = TrackerSession::new(config, TrackerState::default());

    let goals = [
        "prepare alpha analysis report",
        "guitar practice session",
        "kitchen renovation budget",
    ];
    for (index, goal) in goals.iter().enumerate() {
        let now = index as f64 * 60.0;
        let snapshot = SituationalSnapshot {
            id: format!("snap-{index}"),
            timestamp: now,
            activity_summary: format!("window {index} with many distinct terms open"),
            interaction_goal: Some(goal.to_string()),
            candidate_labels: vec![format!("label{index}")],
        };
        session.observe_snapshot(&snapshot).expect("tick must succeed");

        let state = session.state();
        assert!(state.memory.len() <= 10);
        assert!(state.hypotheses.len() <= 2);
    }

    session
        .apply_nudge(
            &sightline::tracker::UserNudge::NewGoal {
                text: "Ship v2 release".to_string(),
            },
            300.0,
        )
        .expect("new goal must succeed");

    let state = session.state();
    assert!(state.hypotheses.len() <= 2);
    let top = session.top_hypotheses(1);
    assert_eq!(top[0].description, "Ship v2 release");
}
