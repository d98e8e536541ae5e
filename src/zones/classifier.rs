use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::detect::{anchor, DetectionBox};
use crate::geometry::Point2D;
use crate::zones::registry::{ZoneRegistry, UNMATCHED_ZONE};

/// Outcome of classifying one anchor point.
///
/// Serialized as the bare zone name, or `"unmatched"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ZoneMatch {
    Zone(String),
    Unmatched,
}

impl ZoneMatch {
    pub fn as_str(&self) -> &str {
        match self {
            ZoneMatch::Zone(name) => name,
            ZoneMatch::Unmatched => UNMATCHED_ZONE,
        }
    }

    pub fn is_unmatched(&self) -> bool {
        matches!(self, ZoneMatch::Unmatched)
    }
}

impl From<String> for ZoneMatch {
    fn from(name: String) -> Self {
        if name == UNMATCHED_ZONE {
            ZoneMatch::Unmatched
        } else {
            ZoneMatch::Zone(name)
        }
    }
}

impl From<ZoneMatch> for String {
    fn from(m: ZoneMatch) -> Self {
        match m {
            ZoneMatch::Zone(name) => name,
            ZoneMatch::Unmatched => UNMATCHED_ZONE.to_string(),
        }
    }
}

impl std::fmt::Display for ZoneMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assigns detections to the first containing zone of their device.
///
/// Zones may overlap; the earlier registered zone wins.
#[derive(Clone, Debug)]
pub struct ZoneClassifier {
    registry: Arc<ZoneRegistry>,
}

impl ZoneClassifier {
    pub fn new(registry: Arc<ZoneRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    pub fn classify(&self, detection: &DetectionBox, device_id: &str) -> ZoneMatch {
        self.classify_point(anchor(detection), device_id)
    }

    pub fn classify_point(&self, point: Point2D, device_id: &str) -> ZoneMatch {
        self.registry
            .zones_for(device_id)
            .iter()
            .find(|zone| zone.contains(point))
            .map(|zone| ZoneMatch::Zone(zone.name().to_string()))
            .unwrap_or(ZoneMatch::Unmatched)
    }
}
