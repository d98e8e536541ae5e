//! Per-frame aggregation of zone classifications.
//!
//! Every batch yields its own complete `AggregateReport`. Cross-batch totals
//! are a separate additive fold (`CountSummary`), never shared accumulation
//! between workers.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::detect::{anchor, CoordinateScaler, DetectionBox};
use crate::geometry::Point2D;
use crate::ingest::{DetectionBatch, FrameId};
use crate::zones::{ZoneClassifier, ZoneMatch, ZoneRegistry, UNMATCHED_ZONE};

/// Detail record for one surviving detection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// 1-based position in the input batch. Dropped boxes leave gaps.
    pub detection_id: usize,
    pub anchor: Point2D,
    pub zone: ZoneMatch,
    pub confidence: f32,
    /// Box in image space (after scaling).
    pub source_box: DetectionBox,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ZoneCount {
    pub zone: String,
    pub count: usize,
}

/// Counts and details for one frame. Built once, read-only afterwards.
#[derive(Clone, Debug, Serialize)]
pub struct AggregateReport {
    device_id: String,
    frame: Option<FrameId>,
    zone_counts: Vec<ZoneCount>,
    total_count: usize,
    dropped_count: usize,
    details: Vec<ClassificationResult>,
}

impl AggregateReport {
    /// Device the frame was classified against.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Frame identity, when the input carried one.
    pub fn frame(&self) -> Option<&FrameId> {
        self.frame.as_ref()
    }

    /// Every configured zone of the device in registry order, then `unmatched`.
    pub fn zone_counts(&self) -> &[ZoneCount] {
        &self.zone_counts
    }

    /// Count for one zone; `None` if the device has no such zone.
    pub fn count_for(&self, zone: &str) -> Option<usize> {
        self.zone_counts
            .iter()
            .find(|c| c.zone == zone)
            .map(|c| c.count)
    }

    /// Boxes that fell in no zone.
    pub fn unmatched_count(&self) -> usize {
        self.count_for(UNMATCHED_ZONE).unwrap_or(0)
    }

    /// Number of boxes that survived validation.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Boxes skipped for non-finite coordinates.
    pub fn dropped_count(&self) -> usize {
        self.dropped_count
    }

    /// Per-box results in input order.
    pub fn details(&self) -> &[ClassificationResult] {
        &self.details
    }
}

/// Zone counts seeded at zero; unmatched is always the last slot.
struct Tally {
    counts: Vec<ZoneCount>,
}

impl Tally {
    fn seeded(zone_names: Vec<&str>) -> Self {
        let counts = zone_names
            .into_iter()
            .chain(std::iter::once(UNMATCHED_ZONE))
            .map(|zone| ZoneCount {
                zone: zone.to_string(),
                count: 0,
            })
            .collect();
        Self { counts }
    }

    fn record(&mut self, zone: &ZoneMatch) {
        let slot = match zone {
            ZoneMatch::Zone(name) => self.counts.iter().position(|c| &c.zone == name),
            ZoneMatch::Unmatched => None,
        }
        .unwrap_or(self.counts.len() - 1);
        self.counts[slot].count += 1;
    }
}

/// Classifies and counts detection batches against a frozen registry.
#[derive(Clone, Debug)]
pub struct Aggregator {
    classifier: ZoneClassifier,
    scaler: CoordinateScaler,
}

impl Aggregator {
    /// Aggregator with identity scaling.
    pub fn new(registry: Arc<ZoneRegistry>) -> Self {
        Self {
            classifier: ZoneClassifier::new(registry),
            scaler: CoordinateScaler::identity(),
        }
    }

    /// Rescale incoming boxes from detection space before classifying.
    pub fn with_scaler(mut self, scaler: CoordinateScaler) -> Self {
        self.scaler = scaler;
        self
    }

    /// Classifier sharing this aggregator's registry.
    pub fn classifier(&self) -> &ZoneClassifier {
        &self.classifier
    }

    /// Detection-to-image scaler applied to each box.
    pub fn scaler(&self) -> &CoordinateScaler {
        &self.scaler
    }

    /// Classify every box of one frame and count per zone.
    pub fn aggregate(&self, boxes: &[DetectionBox], device_id: &str) -> AggregateReport {
        self.build_report(boxes, device_id, None)
    }

    /// Aggregate a batch, resolving a missing device to the default device.
    pub fn aggregate_batch(&self, batch: &DetectionBatch) -> AggregateReport {
        self.build_report(&batch.boxes, batch.device(), batch.frame.clone())
    }

    fn build_report(
        &self,
        boxes: &[DetectionBox],
        device_id: &str,
        frame: Option<FrameId>,
    ) -> AggregateReport {
        let registry = self.classifier.registry();
        if !registry.contains_device(device_id) {
            log::debug!(
                "device '{}' has no zone layout; {} detections will be unmatched",
                device_id,
                boxes.len()
            );
        }
        let mut tally = Tally::seeded(registry.zone_names(device_id));
        let mut details = Vec::with_capacity(boxes.len());
        let mut dropped = 0;

        for (index, raw) in boxes.iter().enumerate() {
            let Some(detection) = self.scaler.scale_box(raw) else {
                log::debug!(
                    "dropping detection {} for device '{}': non-finite coordinates",
                    index + 1,
                    device_id
                );
                dropped += 1;
                continue;
            };
            let point = anchor(&detection);
            let zone = self.classifier.classify_point(point, device_id);
            tally.record(&zone);
            details.push(ClassificationResult {
                detection_id: index + 1,
                anchor: point,
                zone,
                confidence: detection.confidence,
                source_box: detection,
            });
        }

        AggregateReport {
            device_id: device_id.to_string(),
            frame,
            zone_counts: tally.counts,
            total_count: details.len(),
            dropped_count: dropped,
            details,
        }
    }
}

/// Runs many batches across scoped worker threads.
///
/// Workers only read the shared registry; each returns complete reports and
/// results come back in input order.
#[derive(Clone, Debug)]
pub struct BatchRunner {
    aggregator: Aggregator,
    workers: usize,
}

impl BatchRunner {
    /// Runner over `workers` threads; zero is treated as one.
    pub fn new(aggregator: Aggregator, workers: usize) -> Self {
        Self {
            aggregator,
            workers: workers.max(1),
        }
    }

    /// Worker thread count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Aggregate every batch. Fails if a worker panics.
    pub fn run(&self, batches: &[DetectionBatch]) -> Result<Vec<AggregateReport>> {
        if batches.is_empty() {
            return Ok(Vec::new());
        }
        if self.workers == 1 || batches.len() == 1 {
            return Ok(batches
                .iter()
                .map(|b| self.aggregator.aggregate_batch(b))
                .collect());
        }

        let chunk_len = batches.len().div_ceil(self.workers);
        let aggregator = &self.aggregator;
        std::thread::scope(|scope| {
            let handles: Vec<_> = batches
                .chunks(chunk_len)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|b| aggregator.aggregate_batch(b))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut reports = Vec::with_capacity(batches.len());
            for handle in handles {
                let part = handle
                    .join()
                    .map_err(|_| anyhow!("aggregation worker panicked"))?;
                reports.extend(part);
            }
            Ok(reports)
        })
    }
}

/// Additive totals across many reports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CountSummary {
    pub frames: usize,
    pub detections: usize,
    pub dropped: usize,
    /// device -> zone -> count, `unmatched` included.
    pub per_device: BTreeMap<String, BTreeMap<String, usize>>,
}

impl CountSummary {
    /// Fold a set of reports into one summary.
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a AggregateReport>) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.absorb(report);
        }
        summary
    }

    /// Add one report's counts.
    pub fn absorb(&mut self, report: &AggregateReport) {
        self.frames += 1;
        self.detections += report.total_count();
        self.dropped += report.dropped_count();
        let zones = self
            .per_device
            .entry(report.device_id().to_string())
            .or_default();
        for c in report.zone_counts() {
            *zones.entry(c.zone.clone()).or_default() += c.count;
        }
    }

    /// Combine two partial summaries.
    pub fn merge(mut self, other: CountSummary) -> CountSummary {
        self.frames += other.frames;
        self.detections += other.detections;
        self.dropped += other.dropped;
        for (device, zones) in other.per_device {
            let mine = self.per_device.entry(device).or_default();
            for (zone, count) in zones {
                *mine.entry(zone).or_default() += count;
            }
        }
        self
    }

    /// Total for one device zone, zero if never seen.
    pub fn zone_total(&self, device_id: &str, zone: &str) -> usize {
        self.per_device
            .get(device_id)
            .and_then(|zones| zones.get(zone))
            .copied()
            .unwrap_or(0)
    }
}
