use std::fmt;

use serde::{Deserialize, Serialize};

/// Training metadata a participant attaches to its weights.
///
/// Every field is optional on the wire so a missing value can be reported as
/// an invalid field instead of an undecodable body. Integers are signed for
/// the same reason: a negative round must reach validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<i64>,
}

/// The complete hand-off from a participant to the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePacket {
    #[serde(default)]
    pub weights: Vec<f64>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl UpdatePacket {
    /// Creates a fully populated `UpdatePacket`.
    ///
    /// # Arguments
    /// * `hospital_id` - The identity of the submitting participant.
    /// * `round_id` - The round this update belongs to.
    /// * `model_version` - The snapshot version the participant trained against.
    /// * `weights` - The locally trained weights.
    /// * `loss` - The final training loss.
    /// * `data_size` - The amount of local samples.
    ///
    /// # Returns
    /// A new `UpdatePacket` instance.
    pub fn new(
        hospital_id: impl Into<String>,
        round_id: i64,
        model_version: i64,
        weights: Vec<f64>,
        loss: f64,
        data_size: i64,
    ) -> Self {
        Self {
            weights,
            metadata: Metadata {
                hospital_id: Some(hospital_id.into()),
                data_size: Some(data_size),
                loss: Some(loss),
                round_id: Some(round_id),
                model_version: Some(model_version),
            },
        }
    }
}

/// The phase of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundState {
    /// Open for submissions.
    Waiting,
    /// Quorum reached, aggregation in flight.
    Aggregating,
    /// The snapshot was published, the next round is about to open.
    Complete,
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoundState::Waiting => "WAITING",
            RoundState::Aggregating => "AGGREGATING",
            RoundState::Complete => "COMPLETE",
        };

        f.write_str(s)
    }
}

/// Top level outcome marker of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Accepted,
    Rejected,
}

/// Body returned for an accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: Status,
    pub round: u64,
    pub received: usize,
    pub quorum: usize,
    pub state: RoundState,
    pub quorum_reached: bool,
}

/// Machine readable category of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    RoundMismatch,
    RoundClosed,
    DuplicateParticipant,
    InvalidField,
    MalformedBody,
    NoModel,
    NotHalted,
    Unavailable,
}

impl RejectionKind {
    /// The retry hint that goes along with this kind of rejection.
    pub fn retry(self) -> Retry {
        match self {
            RejectionKind::DuplicateParticipant | RejectionKind::Unavailable => Retry::Now,
            RejectionKind::RoundMismatch | RejectionKind::RoundClosed => Retry::NextRound,
            RejectionKind::NoModel => Retry::NextRound,
            RejectionKind::InvalidField
            | RejectionKind::MalformedBody
            | RejectionKind::NotHalted => Retry::Never,
        }
    }
}

/// When a rejected caller should try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retry {
    Now,
    NextRound,
    Never,
}

/// Body returned for every refused request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub status: Status,
    pub reason: RejectionKind,
    pub retry: Retry,
    pub message: String,
}

impl Rejection {
    /// Creates a new `Rejection`, deriving the retry hint from `reason`.
    ///
    /// # Arguments
    /// * `reason` - The category of the rejection.
    /// * `message` - A human readable explanation.
    ///
    /// # Returns
    /// A new `Rejection` instance.
    pub fn new(reason: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            status: Status::Rejected,
            reason,
            retry: reason.retry(),
            message: message.into(),
        }
    }
}

/// Body of `GET /global_model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalModelResponse {
    pub weights: Vec<f64>,
    pub model_version: u64,
    pub round: u64,
    pub contributors: usize,
}

/// Body of `GET /round_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStatusResponse {
    pub round: u64,
    pub quorum: usize,
    pub received: usize,
    pub state: RoundState,
}

/// Body of `GET /updates_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatesCountResponse {
    pub count: usize,
}
