use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// A startup artifact (model or encoders) is absent
    #[error("{resource} not loaded")]
    Unavailable { resource: String },

    /// A required field is absent or null in at least one row
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// A field is present but carries a value of the wrong type
    #[error("Invalid value for field {field}: expected {expected}")]
    InvalidField { field: &'static str, expected: &'static str },

    /// A batch row carries a key outside the known request fields
    #[error("Unexpected field in batch row {row}: {field}")]
    UnexpectedField { row: usize, field: String },

    /// A categorical label is not part of the encoder's fitted classes
    #[error("Unknown room or room type: y contains previously unseen labels: '{label}'")]
    UnknownCategory { column: &'static str, label: String },

    /// Invalid request shape
    #[error("{message}")]
    BadRequest { message: String },

    /// Batch larger than the configured row limit
    #[error("Batch of {rows} rows exceeds the limit of {limit}")]
    PayloadTooLarge { rows: usize, limit: usize },

    /// Request body larger than the configured byte limit
    #[error("{message}")]
    BodyTooLarge { message: String },

    /// Unexpected fault, reported with its message
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn unavailable(resource: impl Into<String>) -> Self {
        Error::Unavailable { resource: resource.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::MissingField { .. }
            | Error::InvalidField { .. }
            | Error::UnexpectedField { .. }
            | Error::UnknownCategory { .. }
            | Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } | Error::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Other(_) => {
                tracing::error!("Unexpected error while serving request: {:#}", self);
            }
            Error::Unavailable { .. } => {
                tracing::warn!("Dependency unavailable: {}", self);
            }
            Error::UnknownCategory { column, label } => {
                tracing::debug!(column, label = %label, "Unknown category");
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Body rejections keep the `{"error": ...}` shape used everywhere else
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::BodyTooLarge { message }
        } else {
            Error::BadRequest { message }
        }
    }
}

/// Type alias for handler results
pub type Result<T> = std::result::Result<T, Error>;
