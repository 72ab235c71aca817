//! HTTP handler for the liveness endpoint.

use axum::{Json, extract::State};

use crate::{AppState, api::models::health::HealthResponse};

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    summary = "Health check",
    description = "Reports that the service is up and whether the prediction model was loaded at startup. Always returns 200.",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.artifacts.is_some()))
}
