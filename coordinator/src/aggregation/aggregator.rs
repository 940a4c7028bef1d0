use std::{fmt, sync::Arc};

use rayon::prelude::*;

use super::{AggregationErr, Result, WeightingPolicy};
use crate::update::Update;

/// Folds the accepted updates of a closed round into the weights of a new snapshot.
///
/// The weighting policy is injected, the folding itself is always the weighted
/// per-dimension mean of the update vectors.
#[derive(Clone)]
pub struct Aggregator {
    policy: Arc<dyn WeightingPolicy>,
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator").finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Creates a new `Aggregator`.
    ///
    /// # Arguments
    /// * `policy` - The weighting policy deciding each update's influence.
    ///
    /// # Returns
    /// A new `Aggregator` instance.
    pub fn new<P>(policy: P) -> Self
    where
        P: WeightingPolicy + 'static,
    {
        Self {
            policy: Arc::new(policy),
        }
    }

    /// Aggregates `updates` into a single weight vector.
    ///
    /// # Arguments
    /// * `updates` - The accepted updates of the round.
    /// * `current_version` - The version of the latest published snapshot, if any.
    ///
    /// # Returns
    /// The aggregated weights, or an `AggregationErr` if the batch is empty, the
    /// dimensions disagree, the policy produced unusable influences or the mean
    /// isn't finite.
    pub fn aggregate(&self, updates: &[Update], current_version: Option<u64>) -> Result<Vec<f64>> {
        let dim = Self::check_dimensions(updates)?;
        let influences = self.policy.influences(updates, current_version);
        let total = Self::check_influences(updates, &influences)?;

        let mut out = vec![0.; dim];
        out.par_iter_mut().enumerate().for_each(|(i, acc)| {
            let sum: f64 = updates
                .iter()
                .zip(&influences)
                .map(|(u, w)| w * u.weights[i])
                .sum();

            *acc = sum / total;

            // `Σ w·x` overflows for values near `f64::MAX`.
            if !acc.is_finite() {
                *acc = updates
                    .iter()
                    .zip(&influences)
                    .map(|(u, w)| (w / total) * u.weights[i])
                    .sum();
            }
        });

        Self::check_output(&out)?;
        Ok(out)
    }

    fn check_output(weights: &[f64]) -> Result<()> {
        match weights.iter().position(|w| !w.is_finite()) {
            Some(dimension) => Err(AggregationErr::NonFiniteResult {
                dimension,
                value: weights[dimension],
            }),
            None => Ok(()),
        }
    }

    fn check_dimensions(updates: &[Update]) -> Result<usize> {
        let Some(first) = updates.first() else {
            return Err(AggregationErr::EmptyBatch);
        };

        let expected = first.dim();

        match updates.iter().find(|u| u.dim() != expected) {
            Some(u) => Err(AggregationErr::DimensionMismatch {
                participant: u.participant_id.clone(),
                expected,
                got: u.dim(),
            }),
            None => Ok(expected),
        }
    }

    fn check_influences(updates: &[Update], influences: &[f64]) -> Result<f64> {
        if influences.len() != updates.len() {
            return Err(AggregationErr::PolicyLengthMismatch {
                expected: updates.len(),
                got: influences.len(),
            });
        }

        for (u, &value) in updates.iter().zip(influences) {
            if !value.is_finite() || value < 0. {
                return Err(AggregationErr::InvalidInfluence {
                    participant: u.participant_id.clone(),
                    value,
                });
            }
        }

        let total: f64 = influences.iter().sum();
        if total <= 0. || !total.is_finite() {
            return Err(AggregationErr::DegenerateInfluences);
        }

        Ok(total)
    }
}
