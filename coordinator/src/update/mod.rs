mod error;

use comms::UpdatePacket;

pub use error::{Result, ValidationErr};

/// One participant's validated contribution to one round.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub participant_id: String,
    pub round_id: u64,
    pub model_version: u64,
    pub weights: Vec<f64>,
    pub quality_score: f64,
    pub sample_count: u64,
}

impl Update {
    /// The length of this update's weight vector.
    pub fn dim(&self) -> usize {
        self.weights.len()
    }
}

impl TryFrom<UpdatePacket> for Update {
    type Error = ValidationErr;

    fn try_from(packet: UpdatePacket) -> Result<Self> {
        let UpdatePacket { weights, metadata } = packet;

        if weights.is_empty() {
            return Err(invalid("weights", "must not be empty"));
        }

        if weights.iter().any(|w| !w.is_finite()) {
            return Err(invalid("weights", "must only contain finite values"));
        }

        let participant_id = required("hospital_id", metadata.hospital_id)?;
        if participant_id.trim().is_empty() {
            return Err(invalid("hospital_id", "must not be empty"));
        }

        let data_size = required("data_size", metadata.data_size)?;
        if data_size <= 0 {
            return Err(invalid("data_size", "must be positive"));
        }

        let loss = required("loss", metadata.loss)?;
        if !loss.is_finite() || loss < 0. {
            return Err(invalid("loss", "must be a finite non negative number"));
        }

        let round_id = non_negative("round_id", metadata.round_id)?;
        let model_version = non_negative("model_version", metadata.model_version)?;

        Ok(Self {
            participant_id,
            round_id,
            model_version,
            weights,
            quality_score: loss,
            sample_count: data_size as u64,
        })
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ValidationErr {
    ValidationErr::Invalid { field, reason }
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or(ValidationErr::Missing { field })
}

fn non_negative(field: &'static str, value: Option<i64>) -> Result<u64> {
    let value = required(field, value)?;
    u64::try_from(value).map_err(|_| invalid(field, "must not be negative"))
}
