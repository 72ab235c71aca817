use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::artifacts::encoder::EncoderSet;

/// Labels accepted by `POST /predict`, in encoder code order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AvailableRoomsResponse {
    #[schema(example = json!(["BR 116", "BR 120"]))]
    pub room_ids: Vec<String>,
    #[schema(example = json!(["Classroom", "Lab"]))]
    pub room_types: Vec<String>,
}

impl From<&EncoderSet> for AvailableRoomsResponse {
    fn from(encoders: &EncoderSet) -> Self {
        Self {
            room_ids: encoders.room_encoder.classes().to_vec(),
            room_types: encoders.type_encoder.classes().to_vec(),
        }
    }
}
