use std::{
    error::Error,
    fmt::{self, Display},
};

use comms::RejectionKind;

use crate::{rounds::RejectReason, update::ValidationErr};

/// The service module's result type.
pub type Result<T> = std::result::Result<T, SubmitErr>;

/// Why a submission was not accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitErr {
    /// The packet has missing or invalid fields.
    Invalid(ValidationErr),
    /// The round tracker refused the submission.
    Rejected(RejectReason),
    /// The aggregation task is no longer running.
    Unavailable,
}

impl SubmitErr {
    /// The wire category of this error.
    pub fn kind(&self) -> RejectionKind {
        match self {
            SubmitErr::Invalid(_) => RejectionKind::InvalidField,
            SubmitErr::Rejected(reason) => reason.kind(),
            SubmitErr::Unavailable => RejectionKind::Unavailable,
        }
    }
}

impl Display for SubmitErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitErr::Invalid(e) => write!(f, "{e}"),
            SubmitErr::Rejected(reason) => write!(f, "{reason}"),
            SubmitErr::Unavailable => f.write_str("aggregation is unavailable"),
        }
    }
}

impl Error for SubmitErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SubmitErr::Invalid(e) => Some(e),
            SubmitErr::Rejected(reason) => Some(reason),
            SubmitErr::Unavailable => None,
        }
    }
}

impl From<ValidationErr> for SubmitErr {
    fn from(value: ValidationErr) -> Self {
        Self::Invalid(value)
    }
}

impl From<RejectReason> for SubmitErr {
    fn from(value: RejectReason) -> Self {
        Self::Rejected(value)
    }
}
