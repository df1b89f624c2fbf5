use std::{
    fs,
    io::{BufWriter, Write},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::{
    continuity::error::{ContinuityError, internal_error, unsupported_version},
    tracker::{ContextMemory, HypothesisSet, KeywordMemoryItem, MainTaskHypothesis, TrackerState},
};

const PERSISTENCE_VERSION: u64 = 1;

/// Versioned on-disk form: each collection is an ordered list of flat
/// records (insertion order), so a load-then-save round trip reproduces
/// weights and timestamps exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedTrackerState {
    version: u64,
    #[serde(default)]
    memory_last_snapshot_id: Option<String>,
    memory_next_seq: u64,
    memory: Vec<KeywordMemoryItem>,
    #[serde(default)]
    hypothesis_last_snapshot_id: Option<String>,
    hypothesis_next_seq: u64,
    hypotheses: Vec<MainTaskHypothesis>,
}

impl PersistedTrackerState {
    fn from_state(state: &TrackerState) -> Self {
        let mut memory: Vec<KeywordMemoryItem> = state.memory.items.values().cloned().collect();
        memory.sort_by_key(|item| item.seq);
        let mut hypotheses: Vec<MainTaskHypothesis> =
            state.hypotheses.items.values().cloned().collect();
        hypotheses.sort_by_key(|item| item.seq);

        Self {
            version: PERSISTENCE_VERSION,
            memory_last_snapshot_id: state.memory.last_snapshot_id.clone(),
            memory_next_seq: state.memory.next_seq,
            memory,
            hypothesis_last_snapshot_id: state.hypotheses.last_snapshot_id.clone(),
            hypothesis_next_seq: state.hypotheses.next_seq,
            hypotheses,
        }
    }

    fn into_state(self) -> TrackerState {
        let mut memory = ContextMemory {
            next_seq: self.memory_next_seq,
            last_snapshot_id: self.memory_last_snapshot_id,
            ..ContextMemory::default()
        };
        for item in self.memory {
            memory.items.insert(item.keyword.clone(), item);
        }

        let mut hypotheses = HypothesisSet {
            next_seq: self.hypothesis_next_seq,
            last_snapshot_id: self.hypothesis_last_snapshot_id,
            ..HypothesisSet::default()
        };
        for item in self.hypotheses {
            hypotheses.items.insert(item.id.clone(), item);
        }

        TrackerState { memory, hypotheses }
    }
}

#[derive(Debug, Clone)]
pub struct TrackerPersistence {
    path: PathBuf,
}

impl TrackerPersistence {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn load(&self) -> Result<Option<TrackerState>, ContinuityError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(internal_error(format!(
                    "failed to read tracker state '{}': {err}",
                    self.path.display()
                )));
            }
        };

        let parsed: PersistedTrackerState = serde_json::from_str(&content).map_err(|err| {
            internal_error(format!(
                "failed to parse tracker state '{}': {err}",
                self.path.display()
            ))
        })?;
        if parsed.version != PERSISTENCE_VERSION {
            return Err(unsupported_version(format!(
                "unsupported tracker state version {} at '{}'",
                parsed.version,
                self.path.display()
            )));
        }

        Ok(Some(parsed.into_state()))
    }

    pub fn save(&self, state: &TrackerState) -> Result<(), ContinuityError> {
        let parent = self.path.parent().ok_or_else(|| {
            internal_error(format!(
                "tracker state path '{}' has no parent",
                self.path.display()
            ))
        })?;
        fs::create_dir_all(parent).map_err(|err| {
            internal_error(format!(
                "failed to create tracker state directory '{}': {err}",
                parent.display()
            ))
        })?;

        let persisted = PersistedTrackerState::from_state(state);

        let tmp_path = self.path.with_extension("tmp");
        let file = fs::File::create(&tmp_path).map_err(|err| {
            internal_error(format!(
                "failed to create tracker temp file '{}': {err}",
                tmp_path.display()
            ))
        })?;
        {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &persisted).map_err(|err| {
                internal_error(format!(
                    "failed to serialize tracker state '{}': {err}",
                    tmp_path.display()
                ))
            })?;
            writer.write_all(b"\n").map_err(|err| {
                internal_error(format!(
                    "failed to finalize tracker state '{}': {err}",
                    tmp_path.display()
                ))
            })?;
            writer.flush().map_err(|err| {
                internal_error(format!(
                    "failed to flush tracker state '{}': {err}",
                    tmp_path.display()
                ))
            })?;
        }

        let tmp_file = fs::OpenOptions::new()
            .read(true)
            .open(&tmp_path)
            .map_err(|err| {
                internal_error(format!(
                    "failed to reopen tracker temp file '{}': {err}",
                    tmp_path.display()
                ))
            })?;
        tmp_file.sync_all().map_err(|err| {
            internal_error(format!(
                "failed to sync tracker temp file '{}': {err}",
                tmp_path.display()
            ))
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|err| {
            internal_error(format!(
                "failed to replace tracker state '{}' from '{}': {err}",
                self.path.display(),
                tmp_path.display()
            ))
        })?;

        if let Ok(parent_file) = fs::File::open(parent) {
            let _ = parent_file.sync_all();
        }

        Ok(())
    }
}
