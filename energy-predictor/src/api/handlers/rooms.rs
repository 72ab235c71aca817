//! HTTP handler listing the categorical labels the encoders recognize.

use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::rooms::AvailableRoomsResponse,
    errors::{Error, Result},
};

#[utoipa::path(
    get,
    path = "/available_rooms",
    tag = "rooms",
    summary = "List known rooms",
    description = "Lists every room identifier and room type the label encoders were fitted on. Only these values are accepted by `POST /predict`.",
    responses(
        (status = 200, description = "Known room identifiers and types", body = AvailableRoomsResponse),
        (status = 500, description = "Encoders not loaded"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn available_rooms(State(state): State<AppState>) -> Result<Json<AvailableRoomsResponse>> {
    let artifacts = state.artifacts.as_ref().ok_or_else(|| Error::unavailable("Encoders"))?;

    Ok(Json(AvailableRoomsResponse::from(artifacts.encoders())))
}
