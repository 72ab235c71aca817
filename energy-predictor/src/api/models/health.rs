use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness report. Returned with 200 whether or not the model is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "Energy Prediction API is running")]
    pub message: String,
    /// False when the model failed to load at startup
    pub model_loaded: bool,
}

impl HealthResponse {
    pub fn healthy(model_loaded: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            message: "Energy Prediction API is running".to_string(),
            model_loaded,
        }
    }
}
