//! Output shapes for downstream consumers: a text report per frame and flat
//! per-frame summary rows.

use serde::Serialize;

use crate::aggregate::{AggregateReport, CountSummary, ZoneCount};

const RULE_WIDTH: usize = 50;

/// One row per processed frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub device_id: String,
    pub timestamp: Option<String>,
    pub loop_count: Option<u64>,
    pub total_detections: usize,
    pub dropped: usize,
    pub counts: Vec<ZoneCount>,
}

impl From<&AggregateReport> for SummaryRow {
    fn from(report: &AggregateReport) -> Self {
        Self {
            device_id: report.device_id().to_string(),
            timestamp: report.frame().map(|f| f.timestamp.clone()),
            loop_count: report.frame().map(|f| f.loop_count),
            total_detections: report.total_count(),
            dropped: report.dropped_count(),
            counts: report.zone_counts().to_vec(),
        }
    }
}

pub fn summary_rows(reports: &[AggregateReport]) -> Vec<SummaryRow> {
    reports.iter().map(SummaryRow::from).collect()
}

pub fn render_text(report: &AggregateReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "Zone occupancy report".to_string(),
        rule,
        format!("Device: {}", report.device_id()),
    ];
    if let Some(frame) = report.frame() {
        lines.push(format!("Frame: {}", frame));
    }
    lines.push(format!("Total detections: {}", report.total_count()));
    if report.dropped_count() > 0 {
        lines.push(format!("Dropped (invalid): {}", report.dropped_count()));
    }

    lines.push(String::new());
    lines.push("[Per-zone counts]".to_string());
    lines.extend(
        report
            .zone_counts()
            .iter()
            .map(|c| format!("{}: {}", c.zone, c.count)),
    );

    lines.push(String::new());
    lines.push("[Details]".to_string());
    lines.extend(report.details().iter().map(|d| {
        format!(
            "#{}: {} (confidence: {:.3}, anchor: ({:.1}, {:.1}))",
            d.detection_id, d.zone, d.confidence, d.anchor.x, d.anchor.y
        )
    }));
    finish(lines)
}

pub fn render_summary(summary: &CountSummary) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "Run summary".to_string(),
        rule,
        format!("Frames: {}", summary.frames),
        format!("Detections: {}", summary.detections),
        format!("Dropped (invalid): {}", summary.dropped),
    ];
    for (device, zones) in &summary.per_device {
        lines.push(String::new());
        lines.push(format!("[{}]", device));
        lines.extend(zones.iter().map(|(zone, count)| format!("{}: {}", zone, count)));
    }
    finish(lines)
}

fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
