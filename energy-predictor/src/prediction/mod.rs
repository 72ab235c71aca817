//! The prediction pipeline behind `POST /predict`.
//!
//! A request body flows through four steps:
//!
//! 1. [`request`]: the body is classified as single or batch and normalized into validated
//!    [`PredictionRequest`] rows
//! 2. [`features`]: categorical columns are encoded into a numeric [`FeatureTable`]
//! 3. [`predict`]: the model is invoked once for the whole table
//! 4. [`response`]: predictions are paired with their inputs
//!
//! Each step fails the whole request; there is no partial success for batches.

pub mod features;
pub mod request;
pub mod response;

use anyhow::ensure;
use serde_json::Value;

use crate::artifacts::{Artifacts, model::Regressor};
use crate::errors::Result;
pub use features::FeatureTable;
pub use request::{PredictionPayload, PredictionRequest};
pub use response::PredictionResponse;

/// Run the model once over `table`, returning one finite prediction per row in row order.
pub fn predict(model: &dyn Regressor, table: &FeatureTable) -> anyhow::Result<Vec<f64>> {
    let predictions = model.predict(table)?;

    ensure!(
        predictions.len() == table.rows().len(),
        "{} model returned {} predictions for {} rows",
        model.kind(),
        predictions.len(),
        table.rows().len()
    );
    if let Some(row) = predictions.iter().position(|p| !p.is_finite()) {
        anyhow::bail!("{} model produced a non-finite prediction for row {}", model.kind(), row);
    }

    Ok(predictions)
}

/// Validate, encode, predict and format one `/predict` body.
#[tracing::instrument(skip_all)]
pub fn run(artifacts: &Artifacts, body: Value, max_batch_size: usize) -> Result<PredictionResponse> {
    let rows = PredictionPayload::from_body(&body)?.normalize(max_batch_size)?;
    let table = FeatureTable::encode(&rows, artifacts.encoders())?;
    let predictions = predict(artifacts.model(), &table)?;

    tracing::debug!(rows = rows.len(), model = artifacts.model().kind(), "Predicted energy use");

    Ok(PredictionResponse::format(body, rows, predictions))
}
