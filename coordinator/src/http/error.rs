use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use comms::{Rejection, RejectionKind};

use crate::{rounds::TransitionErr, service::SubmitErr};

/// A refused request: the status code along with the machine readable body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    rejection: Rejection,
}

impl ApiError {
    /// Creates a new `ApiError`.
    ///
    /// # Arguments
    /// * `status` - The HTTP status code.
    /// * `reason` - The category of the rejection.
    /// * `message` - A human readable explanation.
    ///
    /// # Returns
    /// A new `ApiError` instance.
    pub fn new(status: StatusCode, reason: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            status,
            rejection: Rejection::new(reason, message),
        }
    }

    /// The error returned when no model has been published yet.
    pub fn no_model() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            RejectionKind::NoModel,
            "no global model has been aggregated yet",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.rejection)).into_response()
    }
}

impl From<SubmitErr> for ApiError {
    fn from(value: SubmitErr) -> Self {
        let status = match value {
            SubmitErr::Invalid(_) => StatusCode::BAD_REQUEST,
            SubmitErr::Rejected(_) => StatusCode::CONFLICT,
            SubmitErr::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };

        Self::new(status, value.kind(), value.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            RejectionKind::MalformedBody,
            value.body_text(),
        )
    }
}

impl From<TransitionErr> for ApiError {
    fn from(value: TransitionErr) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            RejectionKind::NotHalted,
            value.to_string(),
        )
    }
}
