use std::{
    error::Error,
    fmt::{self, Display},
};

use comms::{RejectionKind, RoundState};

/// Why the round tracker refused a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The submission targets a round other than the current one.
    RoundMismatch { expected: u64, got: u64 },
    /// The current round stopped accepting submissions.
    RoundClosed { round: u64, state: RoundState },
    /// The participant already submitted for the current round.
    DuplicateParticipant { round: u64, participant: String },
}

impl RejectReason {
    /// The wire category of this rejection.
    pub fn kind(&self) -> RejectionKind {
        match self {
            RejectReason::RoundMismatch { .. } => RejectionKind::RoundMismatch,
            RejectReason::RoundClosed { .. } => RejectionKind::RoundClosed,
            RejectReason::DuplicateParticipant { .. } => RejectionKind::DuplicateParticipant,
        }
    }
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::RoundMismatch { expected, got } => {
                write!(f, "round mismatch: got {got}, current is {expected}")
            }
            RejectReason::RoundClosed { round, state } => {
                write!(f, "round {round} is closed, state is {state}")
            }
            RejectReason::DuplicateParticipant { round, participant } => {
                write!(f, "{participant} already submitted in round {round}")
            }
        }
    }
}

impl Error for RejectReason {}

/// Error returned when a round transition is requested from the wrong state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionErr {
    pub action: &'static str,
    pub round: u64,
    pub state: RoundState,
}

impl Display for TransitionErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            action,
            round,
            state,
        } = self;

        write!(f, "cannot {action} round {round} while {state}")
    }
}

impl Error for TransitionErr {}
