//! # energy-predictor: room energy consumption predictions over HTTP
//!
//! `energy-predictor` loads a pre-trained regression model and two label encoders (room
//! identifiers and room types) at startup and answers single or batch prediction requests for
//! the energy a room booking will consume, given room metadata and environmental readings.
//!
//! ## Request Flow
//!
//! A `POST /predict` body passes through the [`prediction`] pipeline: it is classified as a single
//! row or a `predictions` batch, validated into canonical rows, encoded into a numeric feature
//! table in the column order the model was trained with, predicted in one model call, and
//! formatted back with the original input echoed next to each prediction.
//!
//! ## Shared State
//!
//! The model and encoders are loaded once by [`artifacts::Artifacts::load_or_degrade`] and handed
//! to every handler through [`AppState`]. They are never mutated, so requests need no locking. If
//! loading fails the service still starts: `GET /` reports `model_loaded: false` and the
//! prediction endpoints answer with an "unavailable" error.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use energy_predictor::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = energy_predictor::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     energy_predictor::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod artifacts;
pub mod config;
pub mod errors;
mod openapi;
pub mod prediction;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::artifacts::Artifacts;
use crate::config::CorsOrigin;
pub use crate::config::Config;
use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// `artifacts` is `None` when the model or encoders failed to load at startup; handlers that
/// need them answer with an "unavailable" error.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .maybe_artifacts(Artifacts::load_or_degrade(&config.artifacts).await)
///     .build();
/// ```
#[derive(Clone, Debug, Builder)]
pub struct AppState {
    pub config: Config,
    pub artifacts: Option<Arc<Artifacts>>,
}

/// Create CORS layer from configuration. `None` when no origins are configured.
fn create_cors_layer(config: &Config) -> anyhow::Result<Option<CorsLayer>> {
    let origins = &config.cors.allowed_origins;
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut values = Vec::with_capacity(origins.len());
        for origin in origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins never carry a trailing slash, but parsed URLs do
                values.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(values)
    };

    let mut cors = CorsLayer::new().allow_origin(allow_origin).allow_methods(Any).allow_headers(Any);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(Some(cors))
}

/// Build the application router with all endpoints and middleware:
///
/// - `GET /`, `POST /predict`, `GET /available_rooms`
/// - OpenAPI document and reference UI (when `docs.enabled`)
/// - Prometheus metrics at `/internal/metrics` (when `enable_metrics`)
/// - body size limit, CORS and tracing layers
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let mut router = Router::new()
        .route("/", get(api::handlers::health::health))
        .route("/predict", post(api::handlers::predict::predict))
        .route("/available_rooms", get(api::handlers::rooms::available_rooms))
        .with_state(state.clone());

    if state.config.docs.enabled {
        router = router
            .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
            .merge(Scalar::with_url("/docs", ApiDoc::openapi()));
    }

    router = router.layer(DefaultBodyLimit::max(state.config.max_body_bytes));

    if let Some(cors_layer) = create_cors_layer(&state.config)? {
        router = router.layer(cors_layer);
    }

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct owning the router and its shared state.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] loads the artifacts (or degrades) and builds the router
/// 2. **Serve**: [`Application::serve`] binds to the configured address and handles requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and telemetry
///    is flushed
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application, loading the model and encoders from the configured paths
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting energy predictor with configuration: {:#?}", config);

        let artifacts = artifacts::Artifacts::load_or_degrade(&config.artifacts).await;
        Self::with_artifacts(config, artifacts)
    }

    /// Create an application around already-loaded (or absent) artifacts
    pub fn with_artifacts(config: Config, artifacts: Option<Arc<Artifacts>>) -> anyhow::Result<Self> {
        let app_state = AppState::builder().config(config.clone()).maybe_artifacts(artifacts).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Energy predictor listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
