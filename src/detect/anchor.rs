use crate::detect::result::DetectionBox;
use crate::geometry::Point2D;

/// Bottom-center of a box: where the detected object meets the ground.
///
/// Uses the larger of the two y coordinates so boxes with swapped corners
/// resolve to the same point.
pub fn anchor(detection: &DetectionBox) -> Point2D {
    Point2D::new(
        (detection.x1 + detection.x2) / 2.0,
        detection.y1.max(detection.y2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_is_bottom_center() {
        let b = DetectionBox::new(235.3131, 375.89587, 297.17224, 514.0849, 0.92, 0);
        let p = anchor(&b);
        assert!((p.x - 266.24267).abs() < 1e-9);
        assert_eq!(p.y, 514.0849);
    }

    #[test]
    fn anchor_ignores_corner_order() {
        let straight = DetectionBox::new(10.0, 20.0, 30.0, 80.0, 0.5, 0);
        let swapped = DetectionBox::new(30.0, 80.0, 10.0, 20.0, 0.5, 0);
        assert_eq!(anchor(&straight), anchor(&swapped));
        assert_eq!(anchor(&straight), Point2D::new(20.0, 80.0));
    }
}
