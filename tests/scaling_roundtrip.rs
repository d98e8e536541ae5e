use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use zone_counter::{
    anchor, Aggregator, CoordinateScaler, DetectionBox, Resolution, ZoneClassifier,
    ZoneCounterConfig, ZoneRegistry,
};

/// Layout drawn on the 1024x768 detection frame, registered into `image` space.
fn registry_at(image: (u32, u32)) -> Result<Arc<ZoneRegistry>> {
    let layout = json!({
        "resolution": {
            "detection": {"width": 1024, "height": 768},
            "image": {"width": image.0, "height": image.1}
        },
        "devices": [{
            "id": "cam",
            "reference": {"width": 1024, "height": 768},
            "zones": [
                {"name": "Area B", "polygon": [[0, 0], [400, 0], [400, 200], [0, 280]]},
                {"name": "Area C", "polygon": [[0, 280], [400, 200], [400, 576], [0, 576]]},
                {"name": "Area A", "polygon": [[400, 0], [1024, 0], [1024, 300], [600, 200], [400, 200]]},
                {"name": "Area D", "polygon": [[400, 576], [400, 200], [600, 200], [1024, 300], [1024, 576]]}
            ]
        }]
    });
    let cfg = ZoneCounterConfig::parse(&layout.to_string(), false)?;
    Ok(Arc::new(cfg.build_registry()?))
}

fn grid_boxes() -> Vec<DetectionBox> {
    let mut boxes = Vec::new();
    for i in 0..40 {
        for j in 0..30 {
            let cx = 7.3 + 25.0 * i as f64;
            let bottom = 5.7 + 25.0 * j as f64;
            boxes.push(DetectionBox::new(cx - 10.0, bottom - 40.0, cx + 10.0, bottom, 0.5, 0));
        }
    }
    boxes
}

#[test]
fn scale_then_classify_matches_classify_in_detection_space() -> Result<()> {
    let detection_space = ZoneClassifier::new(registry_at((1024, 768))?);
    let image_space = ZoneClassifier::new(registry_at((4160, 3120))?);
    let scaler = CoordinateScaler::new(Resolution::new(1024, 768)?, Resolution::new(4160, 3120)?)?;

    let mut matched = 0;
    for b in grid_boxes() {
        let before = detection_space.classify(&b, "cam");
        let scaled = scaler.scale_box(&b).expect("finite box");
        let after = image_space.classify(&scaled, "cam");
        assert_eq!(before, after, "box {:?} anchored at {:?}", b, anchor(&b));
        if !before.is_unmatched() {
            matched += 1;
        }
    }
    assert_eq!(matched, 920);
    Ok(())
}

#[test]
fn aggregator_with_scaler_matches_detection_space_counts() -> Result<()> {
    let boxes = grid_boxes();

    let plain = Aggregator::new(registry_at((1024, 768))?).aggregate(&boxes, "cam");
    let scaled = Aggregator::new(registry_at((4160, 3120))?)
        .with_scaler(CoordinateScaler::new(
            Resolution::new(1024, 768)?,
            Resolution::new(4160, 3120)?,
        )?)
        .aggregate(&boxes, "cam");

    assert_eq!(plain.zone_counts(), scaled.zone_counts());
    assert_eq!(plain.count_for("Area D"), Some(326));
    assert_eq!(plain.unmatched_count(), 280);
    assert_eq!(scaled.total_count(), 1200);
    Ok(())
}
