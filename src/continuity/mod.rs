pub mod error;
pub mod persistence;

pub use error::{ContinuityError, ContinuityErrorKind};
pub use persistence::TrackerPersistence;
