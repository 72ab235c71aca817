//! OpenAPI documentation for the prediction API.
//!
//! The generated document is served at `/api-docs/openapi.json` with an interactive reference
//! at `/docs` when `docs.enabled` is set.

use utoipa::OpenApi;

use crate::api;
use crate::prediction::{
    request::{BatchPredictionRequest, PredictionBody, PredictionRequest},
    response::{BatchPredictionEntry, PredictionResponse},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Energy Prediction API",
        description = "Predicts room energy consumption from booking metadata and environmental readings.",
    ),
    paths(
        api::handlers::health::health,
        api::handlers::predict::predict,
        api::handlers::rooms::available_rooms,
    ),
    components(schemas(
        PredictionRequest,
        BatchPredictionRequest,
        PredictionBody,
        PredictionResponse,
        BatchPredictionEntry,
        api::models::health::HealthResponse,
        api::models::rooms::AvailableRoomsResponse,
    )),
    tags(
        (name = "health", description = "Service liveness"),
        (name = "predictions", description = "Energy consumption predictions"),
        (name = "rooms", description = "Room identifiers and types known to the model"),
    )
)]
pub struct ApiDoc;
