use super::WeightingPolicy;
use crate::update::Update;

/// Weights every update by `quality_score^q * sample_count`.
///
/// With `staleness` enabled, an update trained against an older snapshot is
/// further discounted by `1 / (1 + (current_version - model_version))`.
///
/// If the quality term zeroes out every update, the policy falls back to
/// sample-count weighting.
#[derive(Debug, Clone, Copy)]
pub struct Fairness {
    q: f64,
    staleness: bool,
}

impl Fairness {
    /// Creates a new `Fairness` policy.
    ///
    /// # Arguments
    /// * `q` - The fairness exponent applied to the quality score.
    /// * `staleness` - Whether to discount updates trained against older snapshots.
    ///
    /// # Returns
    /// A new `Fairness` instance.
    pub fn new(q: f64, staleness: bool) -> Self {
        Self { q, staleness }
    }

    fn discount(&self, update: &Update, current_version: Option<u64>) -> f64 {
        match current_version {
            Some(current) if self.staleness && update.model_version < current => {
                let lag = current - update.model_version;
                1. / (1. + lag as f64)
            }
            _ => 1.,
        }
    }
}

impl WeightingPolicy for Fairness {
    fn influences(&self, updates: &[Update], current_version: Option<u64>) -> Vec<f64> {
        let sized = |u: &Update| u.sample_count as f64 * self.discount(u, current_version);

        let influences: Vec<_> = updates
            .iter()
            .map(|u| u.quality_score.powf(self.q) * sized(u))
            .collect();

        // Every quality score is zero, weight by samples alone.
        if !influences.is_empty() && influences.iter().all(|&w| w == 0.) {
            return updates.iter().map(sized).collect();
        }

        influences
    }
}
