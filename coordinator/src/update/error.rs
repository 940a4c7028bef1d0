use std::{
    error::Error,
    fmt::{self, Display},
};

/// The specific result type for turning wire packets into updates.
pub type Result<T> = std::result::Result<T, ValidationErr>;

/// Error returned whenever a submitted packet has a missing or invalid field.
///
/// Field names are the ones used on the wire so callers can act on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErr {
    Missing {
        field: &'static str,
    },
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl Display for ValidationErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErr::Missing { field } => write!(f, "missing required field `{field}`"),
            ValidationErr::Invalid { field, reason } => {
                write!(f, "invalid field `{field}`: {reason}")
            }
        }
    }
}

impl Error for ValidationErr {}
