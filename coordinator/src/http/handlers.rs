use axum::{Json, extract::State, extract::rejection::JsonRejection};
use comms::{
    GlobalModelResponse, RoundStatusResponse, Status, SubmitResponse, UpdatePacket,
    UpdatesCountResponse,
};
use log::info;

use super::ApiError;
use crate::{rounds::RoundStatus, service::Coordinator};

type ApiResult<T> = Result<Json<T>, ApiError>;

fn status_response(status: RoundStatus) -> RoundStatusResponse {
    RoundStatusResponse {
        round: status.round,
        quorum: status.quorum,
        received: status.received,
        state: status.state,
    }
}

/// `POST /submit_update`
pub async fn submit_update(
    State(coordinator): State<Coordinator>,
    payload: Result<Json<UpdatePacket>, JsonRejection>,
) -> ApiResult<SubmitResponse> {
    let Json(packet) = payload?;
    let receipt = coordinator.submit(packet).await?;

    Ok(Json(SubmitResponse {
        status: Status::Accepted,
        round: receipt.round,
        received: receipt.received,
        quorum: receipt.quorum,
        state: receipt.state,
        quorum_reached: receipt.quorum_reached,
    }))
}

/// `GET /global_model`
pub async fn global_model(State(coordinator): State<Coordinator>) -> ApiResult<GlobalModelResponse> {
    let snapshot = coordinator.global_model().ok_or_else(ApiError::no_model)?;

    Ok(Json(GlobalModelResponse {
        weights: snapshot.weights.to_vec(),
        model_version: snapshot.version,
        round: snapshot.round,
        contributors: snapshot.contributors,
    }))
}

/// `GET /round_status`
pub async fn round_status(State(coordinator): State<Coordinator>) -> Json<RoundStatusResponse> {
    Json(status_response(coordinator.status()))
}

/// `GET /updates_count`
pub async fn updates_count(State(coordinator): State<Coordinator>) -> Json<UpdatesCountResponse> {
    let count = coordinator.status().received;
    Json(UpdatesCountResponse { count })
}

/// `POST /round/reopen`
pub async fn reopen_round(State(coordinator): State<Coordinator>) -> ApiResult<RoundStatusResponse> {
    let status = coordinator.reopen_round()?;
    info!("round {} reopened by operator", status.round);
    Ok(Json(status_response(status)))
}
