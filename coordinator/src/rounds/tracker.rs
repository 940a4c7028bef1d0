use std::{collections::HashSet, mem, num::NonZeroUsize};

use log::{debug, info, warn};
use parking_lot::Mutex;

use super::{RejectReason, RoundState, TransitionErr};

/// The accepted updates of a round that reached quorum.
#[derive(Debug)]
pub struct RoundBatch<T> {
    pub round: u64,
    pub updates: Vec<T>,
}

/// The answer of `RoundTracker::record_update`.
#[derive(Debug)]
pub enum Admission<T> {
    Accepted {
        round: u64,
        received: usize,
        state: RoundState,
        /// Only present for the submission that completed the quorum.
        batch: Option<RoundBatch<T>>,
    },
    Rejected(RejectReason),
}

impl<T> Admission<T> {
    /// Whether the submission was recorded.
    pub fn accepted(&self) -> bool {
        matches!(self, Admission::Accepted { .. })
    }

    /// Whether this submission completed the quorum of its round.
    pub fn quorum_reached(&self) -> bool {
        matches!(self, Admission::Accepted { batch: Some(_), .. })
    }
}

/// A point in time view of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundStatus {
    pub round: u64,
    pub quorum: usize,
    pub received: usize,
    pub state: RoundState,
}

#[derive(Debug)]
struct Round<T> {
    number: u64,
    state: RoundState,
    /// Set once the aggregation of this round failed, only while aggregating.
    failed: bool,
    participants: HashSet<String>,
    buffer: Vec<T>,
}

impl<T> Round<T> {
    fn open(number: u64) -> Self {
        Self {
            number,
            state: RoundState::Waiting,
            failed: false,
            participants: HashSet::new(),
            buffer: Vec::new(),
        }
    }

    fn in_flight(&self) -> bool {
        self.state == RoundState::Aggregating && !self.failed
    }
}

/// The authoritative state machine deciding whose submission counts and when
/// quorum is reached.
///
/// Participants and the buffered updates of the round live behind the same lock,
/// so recording a participant and appending its update is a single step and
/// exactly one caller observes the quorum.
#[derive(Debug)]
pub struct RoundTracker<T> {
    quorum: NonZeroUsize,
    round: Mutex<Round<T>>,
}

impl<T> RoundTracker<T> {
    /// Creates a new `RoundTracker` waiting on round `0`.
    ///
    /// # Arguments
    /// * `quorum` - The amount of distinct participants needed to close a round.
    ///
    /// # Returns
    /// A new `RoundTracker` instance.
    pub fn new(quorum: NonZeroUsize) -> Self {
        Self {
            quorum,
            round: Mutex::new(Round::open(0)),
        }
    }

    /// The amount of distinct participants needed to close a round.
    pub fn quorum(&self) -> usize {
        self.quorum.get()
    }

    /// Records `participant`'s submission for `round` and buffers its `update`.
    ///
    /// # Arguments
    /// * `participant` - The identity of the submitter.
    /// * `round` - The round the submitter targets.
    /// * `update` - The payload to buffer if the submission is accepted.
    ///
    /// # Returns
    /// The rejection reason, or the acceptance along with the round's batch if this
    /// submission completed the quorum.
    pub fn record_update(&self, participant: &str, round: u64, update: T) -> Admission<T> {
        let quorum = self.quorum.get();
        let mut current = self.round.lock();

        if round != current.number {
            warn!(
                participant = participant, round = round, current = current.number;
                "rejected update: round mismatch"
            );

            return Admission::Rejected(RejectReason::RoundMismatch {
                expected: current.number,
                got: round,
            });
        }

        if current.state != RoundState::Waiting {
            warn!(
                participant = participant, round = current.number;
                "rejected update: round is {}", current.state
            );

            return Admission::Rejected(RejectReason::RoundClosed {
                round: current.number,
                state: current.state,
            });
        }

        if current.participants.contains(participant) {
            warn!(
                participant = participant, round = current.number;
                "rejected duplicate update"
            );

            return Admission::Rejected(RejectReason::DuplicateParticipant {
                round: current.number,
                participant: participant.to_string(),
            });
        }

        current.participants.insert(participant.to_string());
        current.buffer.push(update);
        let received = current.participants.len();

        info!(
            participant = participant, round = current.number;
            "update accepted ({received}/{quorum})"
        );

        let batch = if received >= quorum {
            current.state = RoundState::Aggregating;
            info!(round = current.number; "quorum met, aggregating");

            Some(RoundBatch {
                round: current.number,
                updates: mem::take(&mut current.buffer),
            })
        } else {
            None
        };

        Admission::Accepted {
            round: current.number,
            received,
            state: current.state,
            batch,
        }
    }

    /// Marks the aggregating round as complete once its snapshot is published.
    ///
    /// # Returns
    /// A `TransitionErr` if the round has no aggregation in flight.
    pub fn complete_round(&self) -> Result<(), TransitionErr> {
        let mut current = self.round.lock();
        Self::expect(&current, "complete", current.in_flight())?;

        current.state = RoundState::Complete;
        debug!(round = current.number; "round complete");
        Ok(())
    }

    /// Opens the next round, forgetting the participants of the previous one.
    ///
    /// # Returns
    /// The new round number, or a `TransitionErr` if the current round never
    /// reached quorum or its aggregation failed. In that case nothing changes.
    pub fn advance_round(&self) -> Result<u64, TransitionErr> {
        let mut current = self.round.lock();
        let allowed = current.in_flight() || current.state == RoundState::Complete;
        Self::expect(&current, "advance", allowed)?;

        *current = Round::open(current.number + 1);
        info!(
            round = current.number, quorum = self.quorum.get();
            "advanced round, waiting for participants"
        );

        Ok(current.number)
    }

    /// Records that the aggregation of the current round failed.
    ///
    /// The round stays `AGGREGATING` and keeps rejecting submissions until
    /// `reopen_round` is called.
    ///
    /// # Returns
    /// A `TransitionErr` if the round has no aggregation in flight.
    pub fn fail_round(&self) -> Result<(), TransitionErr> {
        let mut current = self.round.lock();
        Self::expect(&current, "fail", current.in_flight())?;

        current.failed = true;
        warn!(round = current.number; "aggregation failed, round halted");
        Ok(())
    }

    /// Discards a failed round and opens it again under the same number.
    ///
    /// # Returns
    /// The reopened round number, or a `TransitionErr` unless the round's
    /// aggregation failed. A round still being aggregated can't be reopened.
    pub fn reopen_round(&self) -> Result<u64, TransitionErr> {
        let mut current = self.round.lock();
        let halted = current.state == RoundState::Aggregating && current.failed;
        Self::expect(&current, "reopen", halted)?;

        *current = Round::open(current.number);
        warn!(round = current.number; "reopened round, previous submissions discarded");

        Ok(current.number)
    }

    /// Whether the current round is halted after a failed aggregation.
    pub fn is_halted(&self) -> bool {
        let current = self.round.lock();
        current.state == RoundState::Aggregating && current.failed
    }

    /// Returns a consistent snapshot of the current round.
    pub fn status(&self) -> RoundStatus {
        let current = self.round.lock();

        RoundStatus {
            round: current.number,
            quorum: self.quorum.get(),
            received: current.participants.len(),
            state: current.state,
        }
    }

    fn expect(current: &Round<T>, action: &'static str, allowed: bool) -> Result<(), TransitionErr> {
        if allowed {
            return Ok(());
        }

        Err(TransitionErr {
            action,
            round: current.number,
            state: current.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    use super::*;

    fn tracker(quorum: usize) -> RoundTracker<usize> {
        RoundTracker::new(NonZeroUsize::new(quorum).unwrap())
    }

    fn participant(i: usize) -> String {
        format!("H{i}")
    }

    #[test]
    fn test_below_quorum_never_triggers() {
        const QUORUM: usize = 5;

        for n in 1..QUORUM {
            let tracker = tracker(QUORUM);

            for i in 0..n {
                let admission = tracker.record_update(&participant(i), 0, i);
                assert!(admission.accepted());
                assert!(!admission.quorum_reached());
            }

            let status = tracker.status();
            assert_eq!(status.received, n);
            assert_eq!(status.state, RoundState::Waiting);
        }
    }

    #[test]
    fn test_only_the_quorum_call_triggers() {
        const QUORUM: usize = 3;
        let tracker = tracker(QUORUM);

        let triggered: Vec<_> = (0..QUORUM + 2)
            .map(|i| {
                let admission = tracker.record_update(&participant(i), 0, i);
                (admission.accepted(), admission.quorum_reached())
            })
            .collect();

        assert_eq!(
            triggered,
            [
                (true, false),
                (true, false),
                (true, true),
                (false, false),
                (false, false)
            ]
        );
        assert_eq!(tracker.status().state, RoundState::Aggregating);
    }

    #[test]
    fn test_quorum_hands_over_buffered_batch() {
        let tracker = tracker(2);
        tracker.record_update("H1", 0, 10);

        let Admission::Accepted {
            round,
            received,
            state,
            batch: Some(batch),
        } = tracker.record_update("H2", 0, 20)
        else {
            panic!("expected the quorum batch");
        };

        assert_eq!(round, 0);
        assert_eq!(received, 2);
        assert_eq!(state, RoundState::Aggregating);
        assert_eq!(batch.round, 0);
        assert_eq!(batch.updates, vec![10, 20]);
    }

    #[test]
    fn test_duplicate_rejected_at_any_position() {
        const QUORUM: usize = 4;

        for dup_at in 1..QUORUM {
            let tracker = tracker(QUORUM);

            for i in 0..dup_at {
                tracker.record_update(&participant(i), 0, i);
            }

            let admission = tracker.record_update(&participant(0), 0, 99);
            assert!(!admission.accepted());
            assert!(matches!(
                admission,
                Admission::Rejected(RejectReason::DuplicateParticipant { round: 0, .. })
            ));
            assert_eq!(tracker.status().received, dup_at);
        }
    }

    #[test]
    fn test_round_mismatch_rejected_both_ways() {
        let tracker = tracker(2);
        tracker.record_update("H1", 0, 1);
        tracker.record_update("H2", 0, 2);
        tracker.advance_round().unwrap();

        for round in [0, 2, 7, u64::MAX] {
            let admission = tracker.record_update("H3", round, 3);
            let Admission::Rejected(RejectReason::RoundMismatch { expected, got }) = admission
            else {
                panic!("expected a round mismatch for round {round}");
            };

            assert_eq!(expected, 1);
            assert_eq!(got, round);
        }

        assert_eq!(tracker.status().received, 0);
    }

    #[test]
    fn test_closed_round_rejects() {
        let tracker = tracker(1);
        assert!(tracker.record_update("H1", 0, 1).quorum_reached());

        let admission = tracker.record_update("H2", 0, 2);
        assert!(matches!(
            admission,
            Admission::Rejected(RejectReason::RoundClosed {
                round: 0,
                state: RoundState::Aggregating
            })
        ));

        tracker.complete_round().unwrap();
        let admission = tracker.record_update("H2", 0, 2);
        assert!(matches!(
            admission,
            Admission::Rejected(RejectReason::RoundClosed {
                state: RoundState::Complete,
                ..
            })
        ));
    }

    #[test]
    fn test_advance_resets_round() {
        let tracker = tracker(2);
        tracker.record_update("H1", 0, 1);
        tracker.record_update("H2", 0, 2);
        tracker.complete_round().unwrap();

        assert_eq!(tracker.advance_round(), Ok(1));

        let status = tracker.status();
        assert_eq!(status.round, 1);
        assert_eq!(status.received, 0);
        assert_eq!(status.state, RoundState::Waiting);

        // The same participants may submit again in the new round.
        assert!(tracker.record_update("H1", 1, 3).accepted());
    }

    #[test]
    fn test_advance_refused_while_waiting() {
        let tracker = tracker(2);
        tracker.record_update("H1", 0, 1);

        let err = tracker.advance_round().unwrap_err();
        assert_eq!(err.action, "advance");
        assert_eq!(err.state, RoundState::Waiting);

        let status = tracker.status();
        assert_eq!(status.round, 0);
        assert_eq!(status.received, 1);
    }

    #[test]
    fn test_reopen_refused_while_aggregation_in_flight() {
        let tracker = tracker(1);
        assert!(tracker.record_update("H1", 0, 1).quorum_reached());

        let err = tracker.reopen_round().unwrap_err();
        assert_eq!(err.action, "reopen");
        assert_eq!(err.state, RoundState::Aggregating);
        assert!(!tracker.is_halted());

        // The quorum stays spent, nobody can refill the round.
        assert!(!tracker.record_update("H2", 0, 2).accepted());

        tracker.complete_round().unwrap();
        assert!(tracker.reopen_round().is_err());
        assert_eq!(tracker.advance_round(), Ok(1));
    }

    #[test]
    fn test_failed_round_only_reopens() {
        let tracker = tracker(1);
        tracker.record_update("H1", 0, 1);
        tracker.fail_round().unwrap();

        assert!(tracker.is_halted());
        assert_eq!(tracker.status().state, RoundState::Aggregating);
        assert!(tracker.fail_round().is_err());
        assert!(tracker.complete_round().is_err());
        assert!(tracker.advance_round().is_err());
        assert!(!tracker.record_update("H2", 0, 2).accepted());

        assert_eq!(tracker.reopen_round(), Ok(0));
        assert!(!tracker.is_halted());
    }

    #[test]
    fn test_reopen_keeps_round_number() {
        let tracker = tracker(2);
        tracker.record_update("H1", 0, 1);
        tracker.record_update("H2", 0, 2);
        tracker.fail_round().unwrap();

        assert_eq!(tracker.reopen_round(), Ok(0));
        let status = tracker.status();
        assert_eq!(status.round, 0);
        assert_eq!(status.received, 0);
        assert_eq!(status.state, RoundState::Waiting);

        assert!(tracker.reopen_round().is_err());
        assert!(tracker.record_update("H1", 0, 1).accepted());
    }

    #[test]
    fn test_concurrent_burst_triggers_once() {
        const QUORUM: usize = 8;
        const SUBMITTERS: usize = 64;

        let tracker = tracker(QUORUM);
        let accepted = AtomicUsize::new(0);
        let triggered = AtomicUsize::new(0);

        thread::scope(|s| {
            for i in 0..SUBMITTERS {
                let (tracker, accepted, triggered) = (&tracker, &accepted, &triggered);

                s.spawn(move || {
                    let admission = tracker.record_update(&participant(i), 0, i);

                    if admission.accepted() {
                        accepted.fetch_add(1, Ordering::Relaxed);
                    }

                    if admission.quorum_reached() {
                        triggered.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        assert_eq!(accepted.load(Ordering::Relaxed), QUORUM);
        assert_eq!(triggered.load(Ordering::Relaxed), 1);
        assert_eq!(tracker.status().received, QUORUM);
    }
}
