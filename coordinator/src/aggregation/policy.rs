use crate::update::Update;

/// Decides how much each update of a round counts towards the new model.
///
/// Implementors return one raw, non negative influence per update, in order. The
/// `Aggregator` normalizes them so they sum to one.
///
/// Any `Fn(&[Update], Option<u64>) -> Vec<f64>` is a policy as well.
pub trait WeightingPolicy: Send + Sync {
    /// Computes the raw influence of every update.
    ///
    /// # Arguments
    /// * `updates` - The accepted updates of the round.
    /// * `current_version` - The version of the latest published snapshot, if any.
    ///
    /// # Returns
    /// One influence per update.
    fn influences(&self, updates: &[Update], current_version: Option<u64>) -> Vec<f64>;
}

impl<F> WeightingPolicy for F
where
    F: Fn(&[Update], Option<u64>) -> Vec<f64> + Send + Sync,
{
    fn influences(&self, updates: &[Update], current_version: Option<u64>) -> Vec<f64> {
        self(updates, current_version)
    }
}
