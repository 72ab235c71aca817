//! Regression models loaded from the model artifact.
//!
//! The artifact is a JSON document tagged by `kind`:
//!
//! ```json
//! {
//!   "kind": "forest",
//!   "aggregation": "mean",
//!   "trees": [
//!     {"nodes": [
//!       {"feature": 2, "threshold": 1.5, "left": 1, "right": 2},
//!       {"value": 410.0},
//!       {"value": 980.0}
//!     ]}
//!   ]
//! }
//! ```
//!
//! or `{"kind": "linear", "intercept": 12.0, "coefficients": [..6 values..]}`. Both are checked
//! once at load time so prediction never indexes out of bounds.

use anyhow::{Context, bail, ensure};
use serde::Deserialize;

use crate::prediction::features::{FEATURE_COLUMNS, FeatureTable, N_FEATURES};

/// Opaque "feature table in, one number per row out" capability.
pub trait Regressor: Send + Sync {
    /// Short model family name, used in logs.
    fn kind(&self) -> &'static str;

    /// Predict every row of `features` in one call, preserving row order.
    fn predict(&self, features: &FeatureTable) -> anyhow::Result<Vec<f64>>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Forest(TreeEnsemble),
    Linear(LinearModel),
}

impl ModelArtifact {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let model: ModelArtifact = serde_json::from_str(raw).context("model artifact is not valid JSON for any known model kind")?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            ModelArtifact::Forest(forest) => forest.validate(),
            ModelArtifact::Linear(linear) => linear.validate(),
        }
    }

    pub fn into_regressor(self) -> Box<dyn Regressor> {
        match self {
            ModelArtifact::Forest(forest) => Box::new(forest),
            ModelArtifact::Linear(linear) => Box::new(linear),
        }
    }
}

fn check_feature_names(names: &Option<Vec<String>>) -> anyhow::Result<()> {
    if let Some(names) = names {
        ensure!(
            names.iter().map(String::as_str).eq(FEATURE_COLUMNS),
            "model was trained on columns {:?}, expected {:?}",
            names,
            FEATURE_COLUMNS
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Average of tree outputs (random forest)
    #[default]
    Mean,
    /// Sum of tree outputs on top of `base_score` (gradient boosting)
    Sum,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, index: usize) -> anyhow::Result<()> {
        ensure!(!self.nodes.is_empty(), "tree {index} has no nodes");

        for (node_index, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature, left, right, ..
            } = node
            {
                ensure!(
                    *feature < N_FEATURES,
                    "tree {index} node {node_index} splits on feature {feature}, model has {N_FEATURES}"
                );
                // children must point forward, which also rules out cycles
                for child in [*left, *right] {
                    ensure!(
                        child > node_index && child < self.nodes.len(),
                        "tree {index} node {node_index} has invalid child {child}"
                    );
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, row: &[f64; N_FEATURES]) -> f64 {
        let mut current = 0;
        loop {
            match &self.nodes[current] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    current = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Ensemble of binary regression trees.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    fn validate(&self) -> anyhow::Result<()> {
        check_feature_names(&self.feature_names)?;
        ensure!(!self.trees.is_empty(), "forest has no trees");
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index)?;
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64; N_FEATURES]) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.evaluate(row)).sum();
        match self.aggregation {
            Aggregation::Mean => self.base_score + total / self.trees.len() as f64,
            Aggregation::Sum => self.base_score + total,
        }
    }
}

impl Regressor for TreeEnsemble {
    fn kind(&self) -> &'static str {
        "forest"
    }

    fn predict(&self, features: &FeatureTable) -> anyhow::Result<Vec<f64>> {
        Ok(features.rows().iter().map(|row| self.predict_row(&row.values())).collect())
    }
}

/// `intercept + coefficients . row`
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LinearModel {
    fn validate(&self) -> anyhow::Result<()> {
        check_feature_names(&self.feature_names)?;
        if self.coefficients.len() != N_FEATURES {
            bail!(
                "linear model has {} coefficients, expected {}",
                self.coefficients.len(),
                N_FEATURES
            );
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn predict(&self, features: &FeatureTable) -> anyhow::Result<Vec<f64>> {
        Ok(features
            .rows()
            .iter()
            .map(|row| {
                let values = row.values();
                self.intercept + self.coefficients.iter().zip(values.iter()).map(|(c, x)| c * x).sum::<f64>()
            })
            .collect())
    }
}
