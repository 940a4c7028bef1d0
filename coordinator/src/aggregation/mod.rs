mod aggregator;
mod error;
mod fairness;
mod policy;
mod uniform;

pub use aggregator::Aggregator;
pub use error::{AggregationErr, Result};
pub use fairness::Fairness;
pub use policy::WeightingPolicy;
pub use uniform::Uniform;
