use super::WeightingPolicy;
use crate::update::Update;

/// Every update counts the same, the aggregate is the plain per-dimension mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl Uniform {
    /// Creates a new `Uniform` policy.
    ///
    /// # Returns
    /// A new `Uniform` instance.
    pub fn new() -> Self {
        Self
    }
}

impl WeightingPolicy for Uniform {
    fn influences(&self, updates: &[Update], _current_version: Option<u64>) -> Vec<f64> {
        vec![1.; updates.len()]
    }
}
