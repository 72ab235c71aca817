//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for every endpoint
//! - **[`models`]**: Response bodies that are not part of the prediction pipeline itself
//!
//! # Endpoints
//!
//! - `GET /` - liveness plus whether the model is loaded
//! - `POST /predict` - single or batch energy predictions
//! - `GET /available_rooms` - room identifiers and types the encoders recognize
//!
//! All endpoints are documented with `utoipa` annotations; see [`crate::openapi`].

pub mod handlers;
pub mod models;
