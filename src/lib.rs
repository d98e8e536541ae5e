//! Zone Counter
//!
//! Assigns object detections to named per-device zones and counts zone
//! occupancy frame by frame.
//!
//! # Pipeline
//!
//! 1. **Scale**: boxes detected on a downsampled frame are mapped into image
//!    space (`detect::CoordinateScaler`). Boxes with non-finite corners are
//!    dropped here.
//! 2. **Anchor**: each box is reduced to its bottom-center point
//!    (`detect::anchor`).
//! 3. **Classify**: the anchor is tested against the device's zones in
//!    registration order; the first containing zone wins
//!    (`zones::ZoneClassifier`).
//! 4. **Aggregate**: per-zone counts, including an `unmatched` bucket, plus a
//!    detail record per surviving box (`aggregate::Aggregator`).
//!
//! # Module Structure
//!
//! - `geometry`: points, polygons and the even-odd ray cast
//! - `detect`: detection boxes, anchor extraction, coordinate scaling
//! - `zones`: frozen per-device zone registry and classifier
//! - `aggregate`: per-frame reports, parallel batch runner, run summaries
//! - `config`: zone layouts and resolutions from JSON/TOML plus env overrides
//! - `ingest`: typed detection batches from JSON
//! - `report`: text reports and per-frame summary rows

pub mod aggregate;
pub mod config;
pub mod detect;
pub mod geometry;
pub mod ingest;
pub mod report;
pub mod zones;

pub use aggregate::{
    AggregateReport, Aggregator, BatchRunner, ClassificationResult, CountSummary, ZoneCount,
};
pub use config::ZoneCounterConfig;
pub use detect::{anchor, CoordinateScaler, DetectionBox, Resolution};
pub use geometry::{Point2D, Polygon};
pub use ingest::{DetectionBatch, FrameId, InputFormat};
pub use zones::{
    Zone, ZoneClassifier, ZoneMatch, ZoneRegistry, ZoneRegistryBuilder, DEFAULT_DEVICE,
    UNMATCHED_ZONE,
};
