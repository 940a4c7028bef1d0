pub mod coordinator;

pub use coordinator::{CoordinatorSpec, FailurePolicySpec, WeightingSpec};
