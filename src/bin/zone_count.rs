//! zone_count - classify detection batches into device zones and count them
//!
//! Reads a zone layout (JSON or TOML) and a JSON file of detection batches,
//! then writes one report per frame plus a run summary.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use zone_counter::report::{render_summary, render_text, summary_rows};
use zone_counter::{ingest, CountSummary, InputFormat, Resolution, ZoneCounterConfig};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Zone layout file (.toml or .json).
    #[arg(long, env = "ZONE_COUNTER_CONFIG")]
    config: PathBuf,
    /// Detection input file (JSON).
    #[arg(long)]
    input: PathBuf,
    /// Input shape (batches|records).
    #[arg(long, default_value = "batches")]
    input_format: String,
    /// Output format (json|rows|text).
    #[arg(long, default_value = "json")]
    format: String,
    /// Write output here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Override worker thread count.
    #[arg(long)]
    workers: Option<usize>,
    /// Override detection-space resolution (WIDTHxHEIGHT).
    #[arg(long)]
    detection_res: Option<String>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

#[derive(Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Rows,
    Text,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "json" => Ok(Self::Json),
            "rows" => Ok(Self::Rows),
            "text" => Ok(Self::Text),
            other => Err(anyhow!(
                "unknown output format '{}' (expected json|rows|text)",
                other
            )),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let input_format = InputFormat::parse(&args.input_format)?;
    let output_format = OutputFormat::parse(&args.format)?;
    let ui = ui::Ui::new(
        ui::UiMode::parse(&args.ui),
        std::io::stderr().is_terminal(),
        args.output.is_none() && std::io::stdout().is_terminal(),
    );

    let mut cfg = {
        let _stage = ui.stage("Load zone configuration");
        ZoneCounterConfig::load_from(Some(&args.config))?
    };
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err(anyhow!("--workers must be greater than zero"));
        }
        cfg.workers = workers;
    }
    if let Some(res) = &args.detection_res {
        cfg.detection_resolution = Resolution::parse(res)?;
    }
    let runner = cfg.build_runner()?;

    let batches = {
        let mut stage = ui.stage("Read detections");
        let batches = ingest::read_batches(&args.input, input_format)?;
        stage.note(format!("{} batches", batches.len()));
        batches
    };
    let (reports, summary) = {
        let mut stage = ui.stage("Classify and count");
        let reports = runner.run(&batches)?;
        let summary = CountSummary::from_reports(&reports);
        stage.note(format!(
            "{} detections, {} dropped",
            summary.detections, summary.dropped
        ));
        (reports, summary)
    };
    log::info!(
        "{} frames, {} detections counted, {} dropped ({} workers)",
        summary.frames,
        summary.detections,
        summary.dropped,
        runner.workers()
    );

    let rendered = match output_format {
        OutputFormat::Json => serde_json::to_string_pretty(&reports)?,
        OutputFormat::Rows => serde_json::to_string_pretty(&summary_rows(&reports))?,
        OutputFormat::Text => {
            let mut text: String = reports.iter().map(render_text).collect::<Vec<_>>().join("\n");
            text.push('\n');
            text.push_str(&render_summary(&summary));
            text
        }
    };

    match &args.output {
        Some(path) => {
            let _stage = ui.stage("Write output");
            std::fs::write(path, rendered)
                .map_err(|e| anyhow!("failed to write {}: {}", path.display(), e))?;
            println!("report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
