//! Response shaping for single and batch predictions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::prediction::request::PredictionRequest;

/// One prediction together with the row it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchPredictionEntry {
    /// Predicted energy use in watt-hours
    pub predicted_energy_wh: f64,
    pub input: PredictionRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PredictionResponse {
    /// Exactly one row was supplied; the request body is echoed unchanged
    Single {
        predicted_energy_wh: f64,
        input: Value,
    },
    /// Several rows were supplied; entries follow input order
    Batch { predictions: Vec<BatchPredictionEntry> },
}

impl PredictionResponse {
    /// Pair predictions with their rows. `predictions` and `rows` must have equal length.
    pub fn format(body: Value, rows: Vec<PredictionRequest>, predictions: Vec<f64>) -> Self {
        debug_assert_eq!(rows.len(), predictions.len());

        if let &[prediction] = predictions.as_slice() {
            return PredictionResponse::Single {
                predicted_energy_wh: prediction,
                input: body,
            };
        }

        PredictionResponse::Batch {
            predictions: rows
                .into_iter()
                .zip(predictions)
                .map(|(input, predicted_energy_wh)| BatchPredictionEntry { predicted_energy_wh, input })
                .collect(),
        }
    }
}
