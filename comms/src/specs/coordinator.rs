use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

const DEFAULT_QUORUM: usize = 3;

/// The specification for the weighting policy of the aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingSpec {
    /// Plain per-dimension mean.
    #[default]
    Uniform,
    /// `quality_score^q * sample_count`, optionally discounted by staleness.
    Fairness {
        q: f64,
        #[serde(default)]
        staleness: bool,
    },
}

/// What to do with a round whose aggregation failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicySpec {
    /// Reopen the same round with an empty participant set.
    #[default]
    Discard,
    /// Keep the round closed until an operator reopens it.
    Halt,
}

/// The specification for a round coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorSpec {
    #[serde(default = "default_quorum")]
    pub quorum: NonZeroUsize,
    #[serde(default)]
    pub weighting: WeightingSpec,
    #[serde(default)]
    pub failure_policy: FailurePolicySpec,
}

impl Default for CoordinatorSpec {
    fn default() -> Self {
        Self {
            quorum: default_quorum(),
            weighting: WeightingSpec::default(),
            failure_policy: FailurePolicySpec::default(),
        }
    }
}

fn default_quorum() -> NonZeroUsize {
    // SAFETY: The constant is not zero.
    NonZeroUsize::new(DEFAULT_QUORUM).unwrap()
}
