//! HTTP handler for energy predictions.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;

use crate::{
    AppState,
    errors::{Error, Result},
    prediction::{self, PredictionResponse, request::PredictionBody},
};

#[utoipa::path(
    post,
    path = "/predict",
    tag = "predictions",
    summary = "Predict energy use",
    description = "Predicts energy consumption in watt-hours for one room booking, or for several at once when the body carries a `predictions` list.

`base_temp` defaults to 72.0 when omitted. A batch is all-or-nothing: one invalid row rejects the whole request.",
    request_body = PredictionBody,
    responses(
        (status = 200, description = "Prediction for a single row, or one entry per row in input order", body = PredictionResponse),
        (status = 400, description = "Missing required field, invalid value, or unknown room / room type"),
        (status = 413, description = "Batch exceeds the configured row limit"),
        (status = 500, description = "Model not loaded or unexpected prediction failure"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn predict(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    let artifacts = state.artifacts.as_ref().ok_or_else(|| Error::unavailable("Model"))?;
    let Json(body) = body?;

    let response = prediction::run(artifacts, body, state.config.max_batch_size)?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::prediction::request::REQUIRED_FIELDS;
    use crate::test_utils::{create_degraded_test_app, create_test_app, create_test_app_with_config, valid_request};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    fn error_message(response: &axum_test::TestResponse) -> String {
        let json: Value = response.json();
        json["error"].as_str().expect("error body").to_string()
    }

    #[tokio::test]
    async fn test_single_prediction_echoes_input() {
        let app = create_test_app();
        let body = valid_request();

        let response = app.post("/predict").json(&body).await;

        response.assert_status(StatusCode::OK);
        let json: Value = response.json();
        assert!(json["predicted_energy_wh"].is_f64());
        assert_eq!(json["input"], body);
        assert!(json.get("predictions").is_none());
    }

    #[tokio::test]
    async fn test_single_prediction_value() {
        let app = create_test_app();

        // fixture forest: duration 2.0 > 1.5 and occupancy 24 > 20
        let json: Value = app.post("/predict").json(&valid_request()).await.json();

        assert_eq!(json["predicted_energy_wh"], 1450.0);
    }

    #[tokio::test]
    async fn test_missing_base_temp_defaults() {
        let app = create_test_app();
        let mut body = valid_request();
        body.as_object_mut().unwrap().remove("base_temp");

        let response = app.post("/predict").json(&body).await;

        response.assert_status(StatusCode::OK);
        let json: Value = response.json();
        // echoed verbatim, so the default is not written back into the input
        assert!(json["input"].get("base_temp").is_none());
    }

    #[tokio::test]
    async fn test_missing_required_field_names_field() {
        let app = create_test_app();

        for field in REQUIRED_FIELDS {
            let mut body = valid_request();
            body.as_object_mut().unwrap().remove(field);

            let response = app.post("/predict").json(&body).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(error_message(&response), format!("Missing required field: {field}"));
        }
    }

    #[tokio::test]
    async fn test_unknown_room_type_is_bad_request() {
        let app = create_test_app();
        let mut body = valid_request();
        body["room_type"] = json!("Gymnasium");

        let response = app.post("/predict").json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(error_message(&response).starts_with("Unknown room or room type"));
        assert!(error_message(&response).contains("Gymnasium"));
    }

    #[tokio::test]
    async fn test_batch_prediction_preserves_order() {
        let app = create_test_app();
        let body = json!({"predictions": [
            {"room_id": "BR 116", "room_type": "Classroom", "duration": 1.0, "ambient_temp": 80.0, "base_temp": 72.0, "occupancy": 10},
            {"room_id": "CS 201", "room_type": "Lab", "duration": 3.0, "ambient_temp": 90.0, "occupancy": 30},
            {"room_id": "BR 120", "room_type": "Office", "duration": 2.0, "ambient_temp": 60.0, "base_temp": 68.0, "occupancy": 5}
        ]});

        let response = app.post("/predict").json(&body).await;

        response.assert_status(StatusCode::OK);
        let json: Value = response.json();
        let predictions = json["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 3);

        let ids: Vec<&str> = predictions.iter().map(|p| p["input"]["room_id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["BR 116", "CS 201", "BR 120"]);
        assert_eq!(predictions[0]["predicted_energy_wh"], 400.0);
        assert_eq!(predictions[1]["predicted_energy_wh"], 1450.0);
        assert_eq!(predictions[2]["predicted_energy_wh"], 950.0);
        // per-row echo carries the normalized row
        assert_eq!(predictions[1]["input"]["base_temp"], 72.0);
    }

    #[tokio::test]
    async fn test_batch_of_one_uses_single_shape() {
        let app = create_test_app();
        let body = json!({ "predictions": [valid_request()] });

        let json: Value = app.post("/predict").json(&body).await.json();

        assert!(json["predicted_energy_wh"].is_f64());
        assert_eq!(json["input"], body);
    }

    #[tokio::test]
    async fn test_invalid_batch_row_fails_whole_batch() {
        let app = create_test_app();
        let mut bad = valid_request();
        bad["room_id"] = json!("XX 000");
        let body = json!({ "predictions": [valid_request(), bad, valid_request()] });

        let response = app.post("/predict").json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let json: Value = response.json();
        assert!(json.get("predictions").is_none());
    }

    #[tokio::test]
    async fn test_batch_over_limit_is_rejected() {
        let mut config = Config::default();
        config.max_batch_size = 2;
        let app = create_test_app_with_config(config);
        let body = json!({ "predictions": [valid_request(), valid_request(), valid_request()] });

        app.post("/predict")
            .json(&body)
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request_with_error_body() {
        let app = create_test_app();

        let response = app
            .post("/predict")
            .bytes(axum::body::Bytes::from_static(b"{not json"))
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(!error_message(&response).is_empty());
    }

    #[tokio::test]
    async fn test_model_absent_is_unavailable() {
        let app = create_degraded_test_app();

        let response = app.post("/predict").json(&valid_request()).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_message(&response), "Model not loaded");
    }
}
