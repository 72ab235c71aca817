//! Test utilities: fixture artifacts and test servers over the real router.

use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::artifacts::{
    Artifacts,
    encoder::{EncoderSet, LabelEncoder},
    model::{Aggregation, Node, Tree, TreeEnsemble},
};
use crate::config::Config;

/// Single-tree forest over duration (column 2) and occupancy (column 5):
///
/// - duration <= 1.5 → 400
/// - otherwise occupancy <= 20 → 950, else 1450
pub fn test_artifacts() -> Artifacts {
    let forest = TreeEnsemble {
        aggregation: Aggregation::Mean,
        base_score: 0.0,
        feature_names: None,
        trees: vec![Tree {
            nodes: vec![
                Node::Split {
                    feature: 2,
                    threshold: 1.5,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: 400.0 },
                Node::Split {
                    feature: 5,
                    threshold: 20.0,
                    left: 3,
                    right: 4,
                },
                Node::Leaf { value: 950.0 },
                Node::Leaf { value: 1450.0 },
            ],
        }],
    };

    let encoders = EncoderSet {
        room_encoder: LabelEncoder::fit(["CS 201", "BR 116", "BR 120"]),
        type_encoder: LabelEncoder::fit(["Lab", "Office", "Classroom"]),
    };

    Artifacts::new(Box::new(forest), encoders)
}

/// A request every fixture encoder accepts
pub fn valid_request() -> Value {
    json!({
        "room_id": "BR 116",
        "room_type": "Classroom",
        "duration": 2.0,
        "ambient_temp": 85.0,
        "base_temp": 72.0,
        "occupancy": 24
    })
}

pub fn create_test_app_with_config(config: Config) -> TestServer {
    crate::Application::with_artifacts(config, Some(Arc::new(test_artifacts())))
        .expect("Failed to create application")
        .into_test_server()
}

pub fn create_test_app() -> TestServer {
    create_test_app_with_config(Config::default())
}

/// Server whose artifacts failed to load
pub fn create_degraded_test_app() -> TestServer {
    crate::Application::with_artifacts(Config::default(), None)
        .expect("Failed to create application")
        .into_test_server()
}
