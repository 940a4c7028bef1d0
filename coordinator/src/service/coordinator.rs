use std::{num::NonZeroUsize, sync::Arc};

use comms::{RoundState, UpdatePacket};
use log::{debug, error, warn};
use tokio::sync::{mpsc, watch};

use super::{
    Result, SubmitErr,
    task::{AggregationTask, FailurePolicy, RoundOutcome},
};
use crate::{
    aggregation::Aggregator,
    rounds::{Admission, RoundBatch, RoundStatus, RoundTracker, TransitionErr},
    storage::{GlobalModelStore, ModelSnapshot},
    update::Update,
};

/// What an accepted submission tells its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub round: u64,
    pub received: usize,
    pub quorum: usize,
    pub state: RoundState,
    pub quorum_reached: bool,
}

/// The round coordinator, the single entry point for request handlers.
///
/// Cloning yields another handle to the same rounds and model. The round state
/// and its buffered updates share one lock, the published model has its own, so
/// model reads never wait on submissions.
#[derive(Clone)]
pub struct Coordinator {
    tracker: Arc<RoundTracker<Update>>,
    store: Arc<GlobalModelStore>,
    queue: mpsc::Sender<RoundBatch<Update>>,
    outcomes: watch::Receiver<Option<RoundOutcome>>,
}

impl Coordinator {
    /// Creates a new `Coordinator` and spawns its aggregation task.
    ///
    /// Must be called from within a tokio runtime. The task stops once every
    /// handle is dropped.
    ///
    /// # Arguments
    /// * `quorum` - The amount of distinct participants needed to close a round.
    /// * `aggregator` - The aggregator to fold closed rounds with.
    /// * `failure_policy` - What to do with a round whose aggregation failed.
    ///
    /// # Returns
    /// A new `Coordinator` instance.
    pub fn new(quorum: NonZeroUsize, aggregator: Aggregator, failure_policy: FailurePolicy) -> Self {
        let tracker = Arc::new(RoundTracker::new(quorum));
        let store = Arc::new(GlobalModelStore::new());
        let (queue, rx) = mpsc::channel(1);
        let (outcomes_tx, outcomes) = watch::channel(None);

        let task = AggregationTask {
            tracker: Arc::clone(&tracker),
            store: Arc::clone(&store),
            aggregator,
            failure_policy,
            outcomes: outcomes_tx,
        };

        tokio::spawn(task.run(rx));

        Self {
            tracker,
            store,
            queue,
            outcomes,
        }
    }

    /// Validates and records a participant's submission.
    ///
    /// The submission completing the quorum hands the round over to the
    /// aggregation task and returns right away, it does not wait on aggregation.
    ///
    /// # Arguments
    /// * `packet` - The decoded submission.
    ///
    /// # Returns
    /// The receipt of an accepted submission or the reason it was refused.
    pub async fn submit(&self, packet: UpdatePacket) -> Result<SubmitReceipt> {
        let update = Update::try_from(packet).inspect_err(|e| warn!("invalid submission: {e}"))?;
        let participant = update.participant_id.clone();

        debug!(
            "submission from {participant} for round {} ({} weights)",
            update.round_id,
            update.dim()
        );

        match self
            .tracker
            .record_update(&participant, update.round_id, update)
        {
            Admission::Rejected(reason) => Err(reason.into()),
            Admission::Accepted {
                round,
                received,
                state,
                batch,
            } => {
                let quorum_reached = batch.is_some();

                if let Some(batch) = batch {
                    self.enqueue(batch).await?;
                }

                Ok(SubmitReceipt {
                    round,
                    received,
                    quorum: self.tracker.quorum(),
                    state,
                    quorum_reached,
                })
            }
        }
    }

    async fn enqueue(&self, batch: RoundBatch<Update>) -> Result<()> {
        let round = batch.round;

        if self.queue.send(batch).await.is_err() {
            error!(round = round; "aggregation task is gone, dropping round");

            let res = self
                .tracker
                .fail_round()
                .and_then(|_| self.tracker.reopen_round());

            if let Err(e) = res {
                error!(round = round; "could not reopen round: {e}");
            }

            return Err(SubmitErr::Unavailable);
        }

        Ok(())
    }

    /// A consistent snapshot of the current round.
    pub fn status(&self) -> RoundStatus {
        self.tracker.status()
    }

    /// The latest published model, `None` before the first aggregation.
    pub fn global_model(&self) -> Option<ModelSnapshot> {
        self.store.read()
    }

    /// Reopens a round left closed by a failed aggregation.
    ///
    /// # Returns
    /// The status after reopening, or a `TransitionErr` unless the round's
    /// aggregation failed. A round whose aggregation is in flight is refused.
    pub fn reopen_round(&self) -> std::result::Result<RoundStatus, TransitionErr> {
        self.tracker.reopen_round()?;
        Ok(self.tracker.status())
    }

    /// Subscribes to the outcome of closed rounds, only the latest one is kept.
    pub fn outcomes(&self) -> watch::Receiver<Option<RoundOutcome>> {
        self.outcomes.clone()
    }

    /// Waits until the latest outcome belongs to `round`.
    ///
    /// # Arguments
    /// * `round` - The round to wait on.
    ///
    /// # Returns
    /// The outcome, or `None` if the aggregation task stopped.
    pub async fn wait_for_round(&self, round: u64) -> Option<RoundOutcome> {
        let mut outcomes = self.outcomes();
        let outcome = outcomes
            .wait_for(|o| o.as_ref().is_some_and(|o| o.round() == round))
            .await
            .ok()?;

        outcome.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time;

    use super::*;
    use crate::aggregation::{AggregationErr, Uniform};

    fn slow_uniform(updates: &[Update], _: Option<u64>) -> Vec<f64> {
        std::thread::sleep(Duration::from_millis(300));
        vec![1.; updates.len()]
    }

    fn coordinator(quorum: usize, failure_policy: FailurePolicy) -> Coordinator {
        let quorum = NonZeroUsize::new(quorum).unwrap();
        Coordinator::new(quorum, Aggregator::new(Uniform::new()), failure_policy)
    }

    fn packet(id: &str, round: i64, weights: Vec<f64>) -> UpdatePacket {
        UpdatePacket::new(id, round, round, weights, 0.5, 100)
    }

    async fn wait(coordinator: &Coordinator, round: u64) -> RoundOutcome {
        time::timeout(Duration::from_secs(5), coordinator.wait_for_round(round))
            .await
            .expect("aggregation timed out")
            .expect("aggregation task stopped")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_submit_receipts() {
        let coordinator = coordinator(2, FailurePolicy::Discard);

        let first = coordinator
            .submit(packet("H1", 0, vec![1., 2.]))
            .await
            .unwrap();
        assert_eq!(
            first,
            SubmitReceipt {
                round: 0,
                received: 1,
                quorum: 2,
                state: RoundState::Waiting,
                quorum_reached: false
            }
        );

        let second = coordinator
            .submit(packet("H2", 0, vec![3., 4.]))
            .await
            .unwrap();
        assert!(second.quorum_reached);
        assert_eq!(second.state, RoundState::Aggregating);

        let RoundOutcome::Published(snapshot) = wait(&coordinator, 0).await else {
            panic!("expected round 0 to be published");
        };
        assert_eq!(&*snapshot.weights, &[2., 3.]);
        assert_eq!(snapshot.contributors, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_packet_leaves_round_untouched() {
        let coordinator = coordinator(2, FailurePolicy::Discard);

        let err = coordinator
            .submit(packet("H1", 0, Vec::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitErr::Invalid(_)));
        assert_eq!(coordinator.status().received, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_halt_keeps_round_closed() {
        let coordinator = coordinator(2, FailurePolicy::Halt);

        coordinator.submit(packet("H1", 0, vec![1.])).await.unwrap();
        coordinator
            .submit(packet("H2", 0, vec![1., 2.]))
            .await
            .unwrap();

        let outcome = wait(&coordinator, 0).await;
        assert!(matches!(
            outcome,
            RoundOutcome::Failed {
                round: 0,
                error: AggregationErr::DimensionMismatch { .. }
            }
        ));

        assert_eq!(coordinator.status().state, RoundState::Aggregating);
        let err = coordinator
            .submit(packet("H3", 0, vec![1.]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), comms::RejectionKind::RoundClosed);

        let status = coordinator.reopen_round().unwrap();
        assert_eq!(status.round, 0);
        assert_eq!(status.state, RoundState::Waiting);
        assert!(coordinator.global_model().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reopen_refused_while_aggregating() {
        let quorum = NonZeroUsize::new(1).unwrap();
        let coordinator = Coordinator::new(quorum, Aggregator::new(slow_uniform), FailurePolicy::Halt);

        let receipt = coordinator.submit(packet("H1", 0, vec![5.])).await.unwrap();
        assert!(receipt.quorum_reached);

        let err = coordinator.reopen_round().unwrap_err();
        assert_eq!(err.round, 0);
        assert_eq!(err.state, RoundState::Aggregating);

        let err = coordinator
            .submit(packet("H2", 0, vec![7.]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), comms::RejectionKind::RoundClosed);

        let RoundOutcome::Published(snapshot) = wait(&coordinator, 0).await else {
            panic!("expected round 0 to be published");
        };
        assert_eq!(snapshot.version, 0);
        assert_eq!(&*snapshot.weights, &[5.]);

        let status = coordinator.status();
        assert_eq!(status.round, 1);
        assert_eq!(status.state, RoundState::Waiting);
        assert_eq!(coordinator.global_model().unwrap().version, 0);
        assert!(coordinator.reopen_round().is_err());
    }
}
