pub mod error;
pub mod extractor;
pub mod hypothesis;
pub mod memory;
pub mod nudge;
pub mod rank;
pub mod types;

pub use error::{TrackerError, TrackerErrorKind};
pub use extractor::KeywordExtractor;
pub use hypothesis::HypothesisTracker;
pub use memory::ContextStore;
pub use nudge::NudgeProcessor;
pub use rank::{Ranked, top_n};
pub use types::{
    ContextMemory, ExtractedKeyword, HypothesisId, HypothesisOrigin, HypothesisSet,
    HypothesisStage, KeywordKind, KeywordMemoryItem, KeywordSource, LockedKeyword,
    MainTaskHypothesis, SituationalSnapshot, SnapshotId, Timestamp, TrackerConfig, TrackerState,
    UserNudge, clamp_weight,
};
