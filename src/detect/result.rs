use serde::{Deserialize, Deserializer, Serialize};

/// Axis-aligned detection box as produced by an upstream detector.
///
/// Coordinates may arrive non-finite (`null` in JSON input becomes NaN);
/// such boxes are dropped before classification. Every field is required:
/// a record missing one fails to deserialize.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    #[serde(deserialize_with = "nullable_coordinate")]
    pub x1: f64,
    #[serde(deserialize_with = "nullable_coordinate")]
    pub y1: f64,
    #[serde(deserialize_with = "nullable_coordinate")]
    pub x2: f64,
    #[serde(deserialize_with = "nullable_coordinate")]
    pub y2: f64,
    pub confidence: f32,
    #[serde(alias = "classId")]
    pub class_id: i64,
}

impl DetectionBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f32, class_id: i64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_id,
        }
    }

    pub fn has_finite_coords(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
    }
}

fn nullable_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
