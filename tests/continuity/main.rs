mod persistence;

use std::path::PathBuf;

use uuid::Uuid;

pub fn temp_state_path(label: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("sightline-continuity-{label}-{}", Uuid::now_v7()))
        .join("tracker.json")
}
