use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::detect::result::DetectionBox;
use crate::geometry::Polygon;

/// Frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let res = Self { width, height };
        res.validate()?;
        Ok(res)
    }

    /// Parse `WIDTHxHEIGHT`, e.g. `1024x768`.
    pub fn parse(value: &str) -> Result<Self> {
        let (w, h) = value
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow!("resolution must look like WIDTHxHEIGHT, got {:?}", value))?;
        let width = w
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid resolution width {:?}: {}", w, e))?;
        let height = h
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid resolution height {:?}: {}", h, e))?;
        Self::new(width, height)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!(
                "resolution must be non-zero, got {}x{}",
                self.width,
                self.height
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Maps detection-space coordinates into image space with per-axis factors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateScaler {
    scale_x: f64,
    scale_y: f64,
}

impl CoordinateScaler {
    pub fn new(detection: Resolution, image: Resolution) -> Result<Self> {
        detection.validate()?;
        image.validate()?;
        Ok(Self {
            scale_x: image.width as f64 / detection.width as f64,
            scale_y: image.height as f64 / detection.height as f64,
        })
    }

    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.scale_x == 1.0 && self.scale_y == 1.0
    }

    pub fn factors(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// Scaled copy of the box, or `None` when any corner coordinate is not finite.
    pub fn scale_box(&self, detection: &DetectionBox) -> Option<DetectionBox> {
        if !detection.has_finite_coords() {
            return None;
        }
        if self.is_identity() {
            return Some(*detection);
        }
        Some(DetectionBox {
            x1: detection.x1 * self.scale_x,
            y1: detection.y1 * self.scale_y,
            x2: detection.x2 * self.scale_x,
            y2: detection.y2 * self.scale_y,
            ..*detection
        })
    }

    pub fn scale_polygon(&self, polygon: &Polygon) -> Result<Polygon> {
        polygon.scaled(self.scale_x, self.scale_y)
    }
}

impl Default for CoordinateScaler {
    fn default() -> Self {
        Self::identity()
    }
}

/// One-shot scaling of a single box between two resolutions.
pub fn scale(
    detection: &DetectionBox,
    detection_resolution: Resolution,
    image_resolution: Resolution,
) -> Result<Option<DetectionBox>> {
    let scaler = CoordinateScaler::new(detection_resolution, image_resolution)?;
    Ok(scaler.scale_box(detection))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det_res() -> Resolution {
        Resolution::new(1024, 768).unwrap()
    }

    fn img_res() -> Resolution {
        Resolution::new(4160, 3120).unwrap()
    }

    #[test]
    fn scales_each_axis_independently() -> Result<()> {
        let b = DetectionBox::new(512.0, 384.0, 1024.0, 768.0, 0.7, 3);
        let scaled = scale(&b, det_res(), img_res())?.expect("finite box");
        assert_eq!(scaled.x1, 2080.0);
        assert_eq!(scaled.y1, 1560.0);
        assert_eq!(scaled.x2, 4160.0);
        assert_eq!(scaled.y2, 3120.0);
        assert_eq!(scaled.confidence, 0.7);
        assert_eq!(scaled.class_id, 3);
        Ok(())
    }

    #[test]
    fn non_finite_box_is_dropped() -> Result<()> {
        let b = DetectionBox::new(1.0, f64::NAN, 2.0, 3.0, 0.7, 0);
        assert!(scale(&b, det_res(), img_res())?.is_none());
        assert!(CoordinateScaler::identity().scale_box(&b).is_none());
        Ok(())
    }

    #[test]
    fn equal_resolutions_are_identity() -> Result<()> {
        let scaler = CoordinateScaler::new(det_res(), det_res())?;
        assert!(scaler.is_identity());
        let b = DetectionBox::new(1.5, 2.5, 3.5, 4.5, 0.2, 1);
        assert_eq!(scaler.scale_box(&b), Some(b));
        Ok(())
    }

    #[test]
    fn parses_resolution_strings() -> Result<()> {
        assert_eq!(Resolution::parse("1024x768")?, det_res());
        assert_eq!(Resolution::parse(" 4160X3120 ")?, img_res());
        assert!(Resolution::parse("1024").is_err());
        assert!(Resolution::parse("0x768").is_err());
        assert!(Resolution::parse("wide x tall").is_err());
        Ok(())
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let zero = Resolution {
            width: 0,
            height: 10,
        };
        assert!(CoordinateScaler::new(zero, img_res()).is_err());
    }
}
