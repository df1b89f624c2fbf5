use std::fs;

use sightline::{
    continuity::{ContinuityErrorKind, TrackerPersistence},
    session::TrackerSession,
    tracker::{SituationalSnapshot, TrackerConfig, TrackerState, UserNudge},
};

use super::temp_state_path;

fn populated_state() -> TrackerState {
    let mut session = TrackerSession::new(TrackerConfig::default(), TrackerState::default());
    let snapshot = SituationalSnapshot {
        id: "snap-1".to_string(),
        timestamp: 42.5,
        activity_summary: "Editing Project Proposal.docx in Word".to_string(),
        interaction_goal: Some("finalize proposal".to_string()),
        candidate_labels: vec!["word processor".to_string()],
    };
    session.observe_snapshot(&snapshot).expect("tick must succeed");
    session
        .apply_nudge(
            &UserNudge::NewGoal {
                text: "Ship v2 release".to_string(),
            },
            100.25,
        )
        .expect("nudge must succeed");
    session.state().clone()
}

#[test]
fn given_saved_state_when_loaded_then_weights_and_timestamps_round_trip() {
    let path = temp_state_path("round-trip");
    let persistence = TrackerPersistence::new(path.clone());
    let state = populated_state();

    persistence.save(&state).expect("save must succeed");
    let loaded = persistence
        .load()
        .expect("load must succeed")
        .expect("state must be present");

    assert_eq!(loaded, state);

    let _ = fs::remove_file(&path);
}

#[test]
fn given_loaded_state_when_resaved_then_file_content_is_identical() {
    let path = temp_state_path("resave");
    let persistence = TrackerPersistence::new(path.clone());
    let state = populated_state();

    persistence.save(&state).expect("save must succeed");
    let first = fs::read_to_string(&path).expect("state file must exist");

    let loaded = persistence
        .load()
        .expect("load must succeed")
        .expect("state must be present");
    persistence.save(&loaded).expect("resave must succeed");
    let second = fs::read_to_string(&path).expect("state file must exist");

    assert_eq!(first, second);

    let _ = fs::remove_file(&path);
}

#[test]
fn given_missing_file_when_loaded_then_no_state() {
    let persistence = TrackerPersistence::new(temp_state_path("missing"));
    let loaded = persistence.load().expect("missing file is not an error");
    assert!(loaded.is_none());
}

#[test]
fn given_unsupported_version_when_loaded_then_rejected() {
    let path = temp_state_path("version");
    fs::create_dir_all(path.parent().expect("path must have parent"))
        .expect("temp dir must be creatable");
    fs::write(
        &path,
        r#"{"version":99,"memory_next_seq":0,"memory":[],"hypothesis_next_seq":0,"hypotheses":[]}"#,
    )
    .expect("state file must be writable");

    let persistence = TrackerPersistence::new(path.clone());
    let err = persistence.load().expect_err("version 99 must be rejected");
    assert_eq!(err.kind, ContinuityErrorKind::UnsupportedVersion);

    let _ = fs::remove_file(&path);
}
