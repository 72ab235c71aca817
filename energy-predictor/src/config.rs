//! Application configuration management.
//!
//! Configuration is loaded from an optional YAML file with environment variable overrides. The
//! configuration file path defaults to `config.yaml` but can be specified via `-f` flag or the
//! `ENERGY_PREDICTOR_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`, may be absent)
//! 2. **Environment variables** - Variables prefixed with `ENERGY_PREDICTOR_` override YAML values
//! 3. **PORT** - Special case: overrides `port` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ENERGY_PREDICTOR_ARTIFACTS__MODEL_PATH=/models/energy.json` sets `artifacts.model_path`.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8080
//! artifacts:
//!   model_path: energy_prediction_model.json
//!   encoders_path: label_encoders.json
//! max_batch_size: 10000
//! cors:
//!   allowed_origins: ["http://localhost:3000"]
//! enable_metrics: true
//! ```

use anyhow::ensure;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ENERGY_PREDICTOR_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so the service starts with no config file at all.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to ("0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Locations of the trained model and label encoders
    pub artifacts: ArtifactsConfig,
    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
    /// Maximum number of rows accepted in one batch prediction request
    pub max_batch_size: usize,
    /// CORS settings for browser clients
    pub cors: CorsConfig,
    /// API documentation settings
    pub docs: DocsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            artifacts: ArtifactsConfig::default(),
            max_body_bytes: 1024 * 1024,
            max_batch_size: 10_000,
            cors: CorsConfig::default(),
            docs: DocsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

/// Paths to the on-disk artifacts read once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactsConfig {
    /// Serialized regression model
    pub model_path: PathBuf,
    /// Serialized room-id and room-type label encoders
    pub encoders_path: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("energy_prediction_model.json"),
            encoders_path: PathBuf::from("label_encoders.json"),
        }
    }
}

/// CORS configuration. An empty origin list disables the CORS layer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://campus.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocsConfig {
    /// Serve the OpenAPI document and the interactive reference at `/docs`
    pub enabled: bool,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from the file named in `args`, the environment and `PORT`.
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Reject settings the service cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.artifacts.model_path.as_os_str().is_empty(),
            "Config validation: artifacts.model_path cannot be empty"
        );
        ensure!(
            !self.artifacts.encoders_path.as_os_str().is_empty(),
            "Config validation: artifacts.encoders_path cannot be empty"
        );
        ensure!(self.max_batch_size > 0, "Config validation: max_batch_size must be at least 1");
        ensure!(self.max_body_bytes > 0, "Config validation: max_body_bytes must be at least 1");

        let origins = &self.cors.allowed_origins;
        ensure!(
            !(origins.len() > 1 && origins.contains(&CorsOrigin::Wildcard)),
            "Config validation: cors.allowed_origins cannot mix '*' with explicit origins"
        );

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("ENERGY_PREDICTOR_").ignore(&["config"]).split("__"))
            // Hosting platforms hand the listening port over as PORT
            .merge(Env::raw().only(&["PORT"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
