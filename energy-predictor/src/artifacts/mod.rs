//! Startup artifacts: the trained regression model and the two label encoders.
//!
//! Artifacts are read once by [`Artifacts::load_or_degrade`] before the server accepts requests
//! and are shared read-only afterwards. A failed load leaves the service running without them;
//! handlers then answer with an "unavailable" error instead of predicting.

pub mod encoder;
pub mod model;

use anyhow::Context;
use std::{fmt, path::Path, sync::Arc};
use tracing::{error, info, instrument};

use crate::config::ArtifactsConfig;
use encoder::EncoderSet;
use model::{ModelArtifact, Regressor};

pub struct Artifacts {
    model: Box<dyn Regressor>,
    encoders: EncoderSet,
}

impl fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifacts")
            .field("model", &self.model.kind())
            .field("room_ids", &self.encoders.room_encoder.classes().len())
            .field("room_types", &self.encoders.type_encoder.classes().len())
            .finish()
    }
}

impl Artifacts {
    pub fn new(model: Box<dyn Regressor>, encoders: EncoderSet) -> Self {
        Self { model, encoders }
    }

    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    /// Read and validate both artifact files. Fails if either one is missing or malformed.
    pub async fn load(config: &ArtifactsConfig) -> anyhow::Result<Self> {
        let model = read_json(&config.model_path, "model").await?;
        let model = ModelArtifact::from_json(&model).with_context(|| format!("invalid model artifact {}", config.model_path.display()))?;

        let encoders = read_json(&config.encoders_path, "encoders").await?;
        let encoders: EncoderSet = serde_json::from_str(&encoders)
            .with_context(|| format!("invalid encoders artifact {}", config.encoders_path.display()))?;

        Ok(Self::new(model.into_regressor(), encoders))
    }

    /// Load artifacts, logging instead of failing: `None` means the service runs degraded.
    #[instrument(skip_all, fields(model = %config.model_path.display(), encoders = %config.encoders_path.display()))]
    pub async fn load_or_degrade(config: &ArtifactsConfig) -> Option<Arc<Self>> {
        info!("Loading model and encoders...");
        match Self::load(config).await {
            Ok(artifacts) => {
                info!(
                    model = artifacts.model.kind(),
                    room_ids = artifacts.encoders.room_encoder.classes().len(),
                    room_types = artifacts.encoders.type_encoder.classes().len(),
                    "Model and encoders loaded successfully"
                );
                Some(Arc::new(artifacts))
            }
            Err(e) => {
                error!("Error loading model: {:#}. Prediction endpoints will report unavailability", e);
                None
            }
        }
    }
}

async fn read_json(path: &Path, what: &str) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {what} artifact {}", path.display()))
}
