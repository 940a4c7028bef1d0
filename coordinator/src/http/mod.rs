//! The HTTP surface of the coordinator.
//!
//! | Method | Path             | Handler                     |
//! |--------|------------------|-----------------------------|
//! | POST   | `/submit_update` | [`handlers::submit_update`] |
//! | GET    | `/global_model`  | [`handlers::global_model`]  |
//! | GET    | `/round_status`  | [`handlers::round_status`]  |
//! | GET    | `/updates_count` | [`handlers::updates_count`] |
//! | POST   | `/round/reopen`  | [`handlers::reopen_round`]  |

mod error;
pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};

pub use error::ApiError;

use crate::service::Coordinator;

/// Creates the router serving `coordinator`.
///
/// # Arguments
/// * `coordinator` - The coordinator every handler talks to.
///
/// # Returns
/// A router ready to be served.
pub fn router(coordinator: Coordinator) -> Router {
    Router::new()
        .route("/submit_update", post(handlers::submit_update))
        .route("/global_model", get(handlers::global_model))
        .route("/round_status", get(handlers::round_status))
        .route("/updates_count", get(handlers::updates_count))
        .route("/round/reopen", post(handlers::reopen_round))
        .with_state(coordinator)
}
