//! Typed detection input.
//!
//! Upstream tooling turns detector output into JSON; this module reads that
//! JSON into per-frame `DetectionBatch` values. Two shapes are accepted:
//! - batches: `[{"device_id": .., "frame": {..}, "boxes": [..]}, ..]`
//! - flat records, one box per entry with its device and frame, which are
//!   grouped into batches in order of first appearance.
//!
//! Shape violations fail the whole read. Non-finite coordinates do not; those
//! boxes are dropped later by the aggregator.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::detect::DetectionBox;
use crate::zones::DEFAULT_DEVICE;

/// Identifies one captured frame: capture timestamp plus loop counter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameId {
    pub timestamp: String,
    #[serde(alias = "loopCount")]
    pub loop_count: u64,
}

impl FrameId {
    pub fn new(timestamp: impl Into<String>, loop_count: u64) -> Self {
        Self {
            timestamp: timestamp.into(),
            loop_count,
        }
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{:010}", self.timestamp, self.loop_count)
    }
}

/// All detections for one device frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionBatch {
    #[serde(default, alias = "deviceId")]
    pub device_id: Option<String>,
    #[serde(default)]
    pub frame: Option<FrameId>,
    pub boxes: Vec<DetectionBox>,
}

impl DetectionBatch {
    pub fn new(device_id: impl Into<String>, boxes: Vec<DetectionBox>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            frame: None,
            boxes,
        }
    }

    /// Batch for the implicit default device.
    pub fn anonymous(boxes: Vec<DetectionBox>) -> Self {
        Self {
            device_id: None,
            frame: None,
            boxes,
        }
    }

    pub fn with_frame(mut self, frame: FrameId) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Device id, falling back to the default device.
    pub fn device(&self) -> &str {
        self.device_id.as_deref().unwrap_or(DEFAULT_DEVICE)
    }
}

/// One detection row tagged with its device and frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(default, alias = "deviceId")]
    pub device_id: Option<String>,
    #[serde(default)]
    pub frame: Option<FrameId>,
    #[serde(flatten)]
    pub detection: DetectionBox,
}

/// Group records by (device, frame), keeping first-seen order for both the
/// batches and the boxes within each batch. Records without a device group
/// with records naming the default device.
pub fn group_records(records: Vec<DetectionRecord>) -> Vec<DetectionBatch> {
    let mut batches: Vec<DetectionBatch> = Vec::new();
    let mut slots: HashMap<(String, Option<FrameId>), usize> = HashMap::new();
    for record in records {
        let device = record
            .device_id
            .as_deref()
            .unwrap_or(DEFAULT_DEVICE)
            .to_string();
        let key = (device, record.frame);
        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                batches.push(DetectionBatch {
                    device_id: record.device_id,
                    frame: key.1.clone(),
                    boxes: Vec::new(),
                });
                slots.insert(key, batches.len() - 1);
                batches.len() - 1
            }
        };
        batches[slot].boxes.push(record.detection);
    }
    batches
}

pub fn parse_batches(raw: &str) -> Result<Vec<DetectionBatch>> {
    serde_json::from_str(raw).map_err(|e| anyhow!("invalid detection batches: {}", e))
}

pub fn parse_records(raw: &str) -> Result<Vec<DetectionBatch>> {
    let records: Vec<DetectionRecord> =
        serde_json::from_str(raw).map_err(|e| anyhow!("invalid detection records: {}", e))?;
    Ok(group_records(records))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Batches,
    Records,
}

impl InputFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "batches" => Ok(Self::Batches),
            "records" => Ok(Self::Records),
            other => Err(anyhow!(
                "unknown input format '{}' (expected batches|records)",
                other
            )),
        }
    }
}

pub fn read_batches(path: &Path, format: InputFormat) -> Result<Vec<DetectionBatch>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read detections {}: {}", path.display(), e))?;
    let batches = match format {
        InputFormat::Batches => parse_batches(&raw),
        InputFormat::Records => parse_records(&raw),
    }
    .map_err(|e| anyhow!("{}: {}", path.display(), e))?;
    log::debug!("read {} batches from {}", batches.len(), path.display());
    Ok(batches)
}
