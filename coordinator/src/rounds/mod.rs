mod error;
mod tracker;

pub use comms::RoundState;
pub use error::{RejectReason, TransitionErr};
pub use tracker::{Admission, RoundBatch, RoundStatus, RoundTracker};
