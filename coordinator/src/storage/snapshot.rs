use std::sync::Arc;

/// An immutable published version of the aggregated model.
///
/// Cloning is cheap, the weights are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    pub version: u64,
    pub round: u64,
    pub contributors: usize,
    pub weights: Arc<[f64]>,
}
