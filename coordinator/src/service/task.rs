use std::sync::Arc;

use log::{debug, error, warn};
use tokio::{
    sync::{mpsc, watch},
    task,
};

use crate::{
    aggregation::{AggregationErr, Aggregator},
    rounds::{RoundBatch, RoundTracker},
    storage::{GlobalModelStore, ModelSnapshot},
    update::Update,
};

/// What happens to a round whose aggregation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Reopen the same round with no participants, they have to resubmit.
    Discard,
    /// Leave the round closed until `Coordinator::reopen_round` is called.
    ///
    /// Only a failed round can be reopened, a round still being aggregated can't.
    Halt,
}

/// How a round that reached quorum ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    Published(ModelSnapshot),
    Failed { round: u64, error: AggregationErr },
}

impl RoundOutcome {
    /// The round this outcome belongs to.
    pub fn round(&self) -> u64 {
        match self {
            RoundOutcome::Published(snapshot) => snapshot.round,
            RoundOutcome::Failed { round, .. } => *round,
        }
    }
}

/// The background task folding closed rounds into new snapshots, one at a time.
pub(super) struct AggregationTask {
    pub(super) tracker: Arc<RoundTracker<Update>>,
    pub(super) store: Arc<GlobalModelStore>,
    pub(super) aggregator: Aggregator,
    pub(super) failure_policy: FailurePolicy,
    pub(super) outcomes: watch::Sender<Option<RoundOutcome>>,
}

impl AggregationTask {
    /// Processes batches until every sender of `queue` is dropped.
    ///
    /// # Arguments
    /// * `queue` - The receiving end of the closed rounds queue.
    pub(super) async fn run(self, mut queue: mpsc::Receiver<RoundBatch<Update>>) {
        while let Some(batch) = queue.recv().await {
            let outcome = self.process(batch).await;
            self.outcomes.send_replace(Some(outcome));
        }

        debug!("aggregation queue closed, stopping");
    }

    async fn process(&self, batch: RoundBatch<Update>) -> RoundOutcome {
        let RoundBatch { round, updates } = batch;
        let contributors = updates.len();
        let current_version = self.store.version();
        let aggregator = self.aggregator.clone();

        debug!(round = round, contributors = contributors; "aggregating updates");

        let res = task::spawn_blocking(move || aggregator.aggregate(&updates, current_version))
            .await
            .unwrap_or_else(|e| Err(AggregationErr::Interrupted(e.to_string())));

        match res {
            Ok(weights) => {
                let snapshot = self.store.publish(weights, round, contributors);
                self.finish(round);
                RoundOutcome::Published(snapshot)
            }
            Err(error) => {
                error!(round = round; "aggregation failed: {error}");
                self.recover(round);
                RoundOutcome::Failed { round, error }
            }
        }
    }

    fn finish(&self, round: u64) {
        let res = self
            .tracker
            .complete_round()
            .and_then(|_| self.tracker.advance_round());

        if let Err(e) = res {
            error!(round = round; "could not advance past round: {e}");
        }
    }

    fn recover(&self, round: u64) {
        if let Err(e) = self.tracker.fail_round() {
            error!(round = round; "could not halt round: {e}");
            return;
        }

        match self.failure_policy {
            FailurePolicy::Discard => {
                if let Err(e) = self.tracker.reopen_round() {
                    error!(round = round; "could not reopen round: {e}");
                }
            }
            FailurePolicy::Halt => {
                warn!(round = round; "round halted, waiting for an operator to reopen it");
            }
        }
    }
}
