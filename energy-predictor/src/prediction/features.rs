//! Numeric feature assembly.

use crate::artifacts::encoder::EncoderSet;
use crate::errors::{Error, Result};
use crate::prediction::request::PredictionRequest;

/// Column names the model was trained with, in the order it expects them.
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = [
    "Room ID",
    "Room Type",
    "Duration (hrs)",
    "Ambient Temp (°F)",
    "Base Temp (°F)",
    "Occupancy",
];

pub const N_FEATURES: usize = 6;

/// One request row with its categorical fields replaced by encoder codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub room_id: i64,
    pub room_type: i64,
    pub duration: f64,
    pub ambient_temp: f64,
    pub base_temp: f64,
    pub occupancy: i64,
}

impl FeatureRow {
    /// Values in [`FEATURE_COLUMNS`] order.
    pub fn values(&self) -> [f64; N_FEATURES] {
        [
            self.room_id as f64,
            self.room_type as f64,
            self.duration,
            self.ambient_temp,
            self.base_temp,
            self.occupancy as f64,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Encode the categorical columns of every request. Room ids are checked across all rows
    /// before room types, so the first unknown room id wins over any unknown room type.
    pub fn encode(requests: &[PredictionRequest], encoders: &EncoderSet) -> Result<Self> {
        let room_ids = encoders
            .room_encoder
            .transform(requests.iter().map(|r| r.room_id.as_str()))
            .map_err(|e| Error::UnknownCategory {
                column: "room_id",
                label: e.label,
            })?;
        let room_types = encoders
            .type_encoder
            .transform(requests.iter().map(|r| r.room_type.as_str()))
            .map_err(|e| Error::UnknownCategory {
                column: "room_type",
                label: e.label,
            })?;

        let rows = requests
            .iter()
            .zip(room_ids.into_iter().zip(room_types))
            .map(|(request, (room_id, room_type))| FeatureRow {
                room_id,
                room_type,
                duration: request.duration,
                ambient_temp: request.ambient_temp,
                base_temp: request.base_temp,
                occupancy: request.occupancy,
            })
            .collect();

        Ok(Self { rows })
    }
}
