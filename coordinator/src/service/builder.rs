use comms::specs::{CoordinatorSpec, FailurePolicySpec, WeightingSpec};
use log::info;

use super::{Coordinator, FailurePolicy};
use crate::aggregation::{Aggregator, Fairness, Uniform};

/// Builds `Coordinator`s given a specification.
#[derive(Debug, Default)]
pub struct CoordinatorBuilder;

impl CoordinatorBuilder {
    /// Creates a new `CoordinatorBuilder`.
    ///
    /// # Returns
    /// A new `CoordinatorBuilder` instance.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Coordinator` following a `CoordinatorSpec`.
    ///
    /// Must be called from within a tokio runtime, see `Coordinator::new`.
    ///
    /// # Arguments
    /// * `spec` - The specification of the coordinator.
    ///
    /// # Returns
    /// A new `Coordinator`.
    pub fn build(&self, spec: CoordinatorSpec) -> Coordinator {
        info!(
            "building coordinator: quorum={} weighting={:?} failure_policy={:?}",
            spec.quorum, spec.weighting, spec.failure_policy
        );

        let aggregator = self.resolve_aggregator(spec.weighting);
        let failure_policy = self.resolve_failure_policy(spec.failure_policy);
        Coordinator::new(spec.quorum, aggregator, failure_policy)
    }

    /// Resolves the `Aggregator` and its weighting policy.
    ///
    /// # Arguments
    /// * `spec` - The specification of the weighting policy.
    ///
    /// # Returns
    /// A new aggregator.
    fn resolve_aggregator(&self, spec: WeightingSpec) -> Aggregator {
        match spec {
            WeightingSpec::Uniform => Aggregator::new(Uniform::new()),
            WeightingSpec::Fairness { q, staleness } => {
                Aggregator::new(Fairness::new(q, staleness))
            }
        }
    }

    fn resolve_failure_policy(&self, spec: FailurePolicySpec) -> FailurePolicy {
        match spec {
            FailurePolicySpec::Discard => FailurePolicy::Discard,
            FailurePolicySpec::Halt => FailurePolicy::Halt,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use comms::{RoundState, UpdatePacket};

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_build_from_spec() {
        let spec = CoordinatorSpec {
            quorum: NonZeroUsize::new(4).unwrap(),
            weighting: WeightingSpec::Fairness {
                q: 1.,
                staleness: true,
            },
            failure_policy: FailurePolicySpec::Halt,
        };

        let coordinator = CoordinatorBuilder::new().build(spec);
        let status = coordinator.status();

        assert_eq!(status.quorum, 4);
        assert_eq!(status.round, 0);
        assert_eq!(status.state, RoundState::Waiting);

        let packet = UpdatePacket::new("H1", 0, 0, vec![1.], 0.5, 10);
        let receipt = coordinator.submit(packet).await.unwrap();
        assert_eq!(receipt.quorum, 4);
        assert!(!receipt.quorum_reached);
    }
}
