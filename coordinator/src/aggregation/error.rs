use std::{
    error::Error,
    fmt::{self, Display},
};

/// The specific result type for the aggregation module.
pub type Result<T> = std::result::Result<T, AggregationErr>;

/// Error returned whenever a batch of updates can't be folded into a model.
///
/// None of these leave partial results behind, the caller decides what to do
/// with the round.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationErr {
    EmptyBatch,
    DimensionMismatch {
        participant: String,
        expected: usize,
        got: usize,
    },
    PolicyLengthMismatch {
        expected: usize,
        got: usize,
    },
    InvalidInfluence {
        participant: String,
        value: f64,
    },
    DegenerateInfluences,
    NonFiniteResult {
        dimension: usize,
        value: f64,
    },
    Interrupted(String),
}

impl Display for AggregationErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationErr::EmptyBatch => f.write_str("no updates to aggregate"),
            AggregationErr::DimensionMismatch {
                participant,
                expected,
                got,
            } => write!(
                f,
                "weights of {participant} have {got} dimensions, expected {expected}"
            ),
            AggregationErr::PolicyLengthMismatch { expected, got } => write!(
                f,
                "weighting policy returned {got} influences for {expected} updates"
            ),
            AggregationErr::InvalidInfluence { participant, value } => {
                write!(f, "invalid influence {value} for {participant}")
            }
            AggregationErr::DegenerateInfluences => f.write_str("influences sum to zero"),
            AggregationErr::NonFiniteResult { dimension, value } => {
                write!(f, "aggregated weight {dimension} is {value}")
            }
            AggregationErr::Interrupted(detail) => write!(f, "aggregation interrupted: {detail}"),
        }
    }
}

impl Error for AggregationErr {}
