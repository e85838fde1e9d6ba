//! HTTP prediction service.

pub mod dto;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};

pub use state::AppState;

/// Build the router for the prediction API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/model-info", get(handlers::model_info_handler))
        .route("/predict", post(handlers::predict_handler))
        .with_state(state)
}
