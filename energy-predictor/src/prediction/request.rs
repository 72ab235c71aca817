//! Request normalization: single or batch JSON bodies into one canonical row sequence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::errors::{Error, Result};

/// Base temperature assumed when a row does not carry one.
pub const DEFAULT_BASE_TEMP: f64 = 72.0;

/// Key whose presence marks a body as a batch request.
pub const BATCH_FIELD: &str = "predictions";

/// Fields that must be present and non-null in every row, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 5] = ["room_id", "room_type", "duration", "ambient_temp", "occupancy"];

const KNOWN_FIELDS: [&str; 6] = ["room_id", "room_type", "duration", "ambient_temp", "base_temp", "occupancy"];

/// One validated prediction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionRequest {
    /// Room identifier, e.g. "BR 116"
    #[schema(example = "BR 116")]
    pub room_id: String,
    /// Room category, e.g. "Classroom"
    #[schema(example = "Classroom")]
    pub room_type: String,
    /// Booking duration in hours
    #[schema(example = 2.0)]
    pub duration: f64,
    /// Outside temperature in °F
    #[schema(example = 85.0)]
    pub ambient_temp: f64,
    /// Target indoor temperature in °F (defaults to 72.0)
    #[serde(default = "default_base_temp")]
    #[schema(example = 72.0)]
    pub base_temp: f64,
    /// Number of people in the room
    #[schema(example = 24)]
    pub occupancy: i64,
}

fn default_base_temp() -> f64 {
    DEFAULT_BASE_TEMP
}

/// Several rows predicted as one all-or-nothing unit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchPredictionRequest {
    pub predictions: Vec<PredictionRequest>,
}

/// Documented shape of a `/predict` body. Parsing goes through [`PredictionPayload`] so that
/// missing and mistyped fields produce field-level errors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PredictionBody {
    Batch(BatchPredictionRequest),
    Single(PredictionRequest),
}

/// Body shape, discriminated by the presence of the batch field.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionPayload {
    Single(Map<String, Value>),
    Batch(Vec<Value>),
}

impl PredictionPayload {
    pub fn from_body(body: &Value) -> Result<Self> {
        let Value::Object(object) = body else {
            return Err(Error::BadRequest {
                message: "Request body must be a JSON object".to_string(),
            });
        };

        match object.get(BATCH_FIELD) {
            None => Ok(PredictionPayload::Single(object.clone())),
            Some(Value::Array(rows)) => Ok(PredictionPayload::Batch(rows.clone())),
            Some(_) => Err(Error::BadRequest {
                message: format!("'{BATCH_FIELD}' must be a list of prediction objects"),
            }),
        }
    }

    /// Validate and convert into canonical rows. Any invalid row fails the whole request.
    pub fn normalize(&self, max_batch_size: usize) -> Result<Vec<PredictionRequest>> {
        let rows: Vec<&Map<String, Value>> = match self {
            PredictionPayload::Single(object) => vec![object],
            PredictionPayload::Batch(rows) => {
                if rows.is_empty() {
                    return Err(Error::BadRequest {
                        message: format!("'{BATCH_FIELD}' must contain at least one row"),
                    });
                }
                if rows.len() > max_batch_size {
                    return Err(Error::PayloadTooLarge {
                        rows: rows.len(),
                        limit: max_batch_size,
                    });
                }
                rows.iter()
                    .enumerate()
                    .map(|(index, row)| batch_row(index, row))
                    .collect::<Result<_>>()?
            }
        };

        // Column by column, so the error names the first missing column rather than the first bad row
        for field in REQUIRED_FIELDS {
            if rows.iter().any(|row| row.get(field).is_none_or(Value::is_null)) {
                return Err(Error::MissingField { field });
            }
        }

        rows.into_iter().map(parse_row).collect()
    }
}

fn batch_row(index: usize, row: &Value) -> Result<&Map<String, Value>> {
    let Value::Object(object) = row else {
        return Err(Error::BadRequest {
            message: format!("Batch row {index} must be a JSON object"),
        });
    };

    if let Some(unexpected) = object.keys().find(|key| !KNOWN_FIELDS.contains(&key.as_str())) {
        return Err(Error::UnexpectedField {
            row: index,
            field: unexpected.clone(),
        });
    }

    Ok(object)
}

fn parse_row(row: &Map<String, Value>) -> Result<PredictionRequest> {
    let base_temp = match row.get("base_temp") {
        None | Some(Value::Null) => DEFAULT_BASE_TEMP,
        Some(value) => number(value, "base_temp")?,
    };

    Ok(PredictionRequest {
        room_id: string(&row["room_id"], "room_id")?,
        room_type: string(&row["room_type"], "room_type")?,
        duration: number(&row["duration"], "duration")?,
        ambient_temp: number(&row["ambient_temp"], "ambient_temp")?,
        base_temp,
        occupancy: count(&row["occupancy"], "occupancy")?,
    })
}

fn string(value: &Value, field: &'static str) -> Result<String> {
    value.as_str().map(str::to_string).ok_or(Error::InvalidField {
        field,
        expected: "string",
    })
}

fn number(value: &Value, field: &'static str) -> Result<f64> {
    value.as_f64().ok_or(Error::InvalidField {
        field,
        expected: "number",
    })
}

fn count(value: &Value, field: &'static str) -> Result<i64> {
    let invalid = Error::InvalidField {
        field,
        expected: "non-negative integer",
    };

    let parsed = match value.as_i64() {
        Some(n) => n,
        // 24.0 is accepted as 24
        None => match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            _ => return Err(invalid),
        },
    };

    if parsed < 0 {
        return Err(invalid);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LIMIT: usize = 100;

    fn single() -> Value {
        json!({
            "room_id": "BR 116",
            "room_type": "Classroom",
            "duration": 2.0,
            "ambient_temp": 85.0,
            "base_temp": 70.0,
            "occupancy": 24
        })
    }

    fn normalize(body: Value) -> Result<Vec<PredictionRequest>> {
        PredictionPayload::from_body(&body)?.normalize(LIMIT)
    }

    #[test]
    fn test_single_body_normalizes_to_one_row() {
        let rows = normalize(single()).unwrap();

        assert_eq!(
            rows,
            vec![PredictionRequest {
                room_id: "BR 116".to_string(),
                room_type: "Classroom".to_string(),
                duration: 2.0,
                ambient_temp: 85.0,
                base_temp: 70.0,
                occupancy: 24,
            }]
        );
    }

    #[test]
    fn test_base_temp_defaults_when_absent_or_null() {
        let mut body = single();
        body.as_object_mut().unwrap().remove("base_temp");
        assert_eq!(normalize(body).unwrap()[0].base_temp, 72.0);

        let mut body = single();
        body["base_temp"] = Value::Null;
        assert_eq!(normalize(body).unwrap()[0].base_temp, 72.0);

        let batch = json!({"predictions": [{"room_id": "A", "room_type": "Lab", "duration": 1, "ambient_temp": 60, "occupancy": 3}]});
        assert_eq!(normalize(batch).unwrap()[0].base_temp, 72.0);
    }

    #[test]
    fn test_each_required_field_is_named_when_missing() {
        for field in REQUIRED_FIELDS {
            let mut body = single();
            body.as_object_mut().unwrap().remove(field);

            let err = normalize(body).unwrap_err();
            assert_eq!(err.to_string(), format!("Missing required field: {field}"));
        }
    }

    #[test]
    fn test_null_required_field_counts_as_missing() {
        let mut body = single();
        body["duration"] = Value::Null;

        assert!(matches!(normalize(body), Err(Error::MissingField { field: "duration" })));
    }

    #[test]
    fn test_single_body_ignores_extra_keys() {
        let mut body = single();
        body["note"] = json!("ignored");

        assert_eq!(normalize(body).unwrap().len(), 1);
    }

    #[test]
    fn test_batch_preserves_order() {
        let body = json!({"predictions": [
            {"room_id": "B", "room_type": "Lab", "duration": 1.0, "ambient_temp": 60.0, "base_temp": 70.0, "occupancy": 3},
            {"room_id": "A", "room_type": "Office", "duration": 3.5, "ambient_temp": 90.0, "occupancy": 1},
            {"room_id": "C", "room_type": "Lab", "duration": 0.5, "ambient_temp": 75.0, "base_temp": 68.0, "occupancy": 40}
        ]});

        let rows = normalize(body).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.room_id.as_str()).collect();
        assert_eq!(ids, ["B", "A", "C"]);
        assert_eq!(rows[1].duration, 3.5);
    }

    #[test]
    fn test_missing_field_in_any_batch_row_fails_whole_batch() {
        let body = json!({"predictions": [
            {"room_id": "A", "room_type": "Lab", "duration": 1.0, "ambient_temp": 60.0, "occupancy": 3},
            {"room_id": "B", "room_type": "Lab", "duration": 1.0, "occupancy": 3}
        ]});

        assert!(matches!(normalize(body), Err(Error::MissingField { field: "ambient_temp" })));
    }

    #[test]
    fn test_first_missing_column_is_reported() {
        // row 0 lacks occupancy, row 1 lacks room_type; room_type comes first in column order
        let body = json!({"predictions": [
            {"room_id": "A", "room_type": "Lab", "duration": 1.0, "ambient_temp": 60.0},
            {"room_id": "B", "duration": 1.0, "ambient_temp": 60.0, "occupancy": 3}
        ]});

        assert!(matches!(normalize(body), Err(Error::MissingField { field: "room_type" })));
    }

    #[test]
    fn test_batch_rejects_unexpected_keys() {
        let body = json!({"predictions": [
            {"room_id": "A", "room_type": "Lab", "duration": 1.0, "ambient_temp": 60.0, "occupancy": 3, "floor": 2}
        ]});

        let err = normalize(body).unwrap_err();
        assert!(matches!(err, Error::UnexpectedField { row: 0, ref field } if field == "floor"));
    }

    #[test]
    fn test_batch_shape_errors() {
        assert!(matches!(normalize(json!({"predictions": {}})), Err(Error::BadRequest { .. })));
        assert!(matches!(normalize(json!({"predictions": []})), Err(Error::BadRequest { .. })));
        assert!(matches!(normalize(json!({"predictions": [1, 2]})), Err(Error::BadRequest { .. })));
        assert!(matches!(normalize(json!([single()])), Err(Error::BadRequest { .. })));
    }

    #[test]
    fn test_batch_size_limit() {
        let rows: Vec<Value> = (0..3).map(|_| single()).collect();
        let payload = PredictionPayload::from_body(&json!({ "predictions": rows })).unwrap();

        assert!(payload.normalize(3).is_ok());
        assert!(matches!(payload.normalize(2), Err(Error::PayloadTooLarge { rows: 3, limit: 2 })));
    }

    #[test]
    fn test_wrong_types_are_client_errors() {
        let mut body = single();
        body["duration"] = json!("two hours");
        assert!(matches!(normalize(body), Err(Error::InvalidField { field: "duration", .. })));

        let mut body = single();
        body["room_id"] = json!(116);
        assert!(matches!(normalize(body), Err(Error::InvalidField { field: "room_id", .. })));

        let mut body = single();
        body["base_temp"] = json!("warm");
        assert!(matches!(normalize(body), Err(Error::InvalidField { field: "base_temp", .. })));
    }

    #[test]
    fn test_occupancy_must_be_whole_and_non_negative() {
        let mut body = single();
        body["occupancy"] = json!(24.0);
        assert_eq!(normalize(body).unwrap()[0].occupancy, 24);

        let mut body = single();
        body["occupancy"] = json!(2.5);
        assert!(matches!(normalize(body), Err(Error::InvalidField { field: "occupancy", .. })));

        let mut body = single();
        body["occupancy"] = json!(-1);
        assert!(matches!(normalize(body), Err(Error::InvalidField { field: "occupancy", .. })));
    }
}
