use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

impl UiMode {
    pub fn parse(flag: &str) -> Self {
        match flag {
            "plain" => UiMode::Plain,
            "pretty" => UiMode::Pretty,
            _ => UiMode::Auto,
        }
    }
}

/// Stage reporting on stderr: spinners on a terminal, `==>` lines otherwise.
#[derive(Clone, Debug)]
pub struct Ui {
    pretty: bool,
}

impl Ui {
    /// `report_on_tty` disables spinners in auto mode so they do not
    /// interleave with report text written to a terminal stdout.
    pub fn new(mode: UiMode, stderr_is_tty: bool, report_on_tty: bool) -> Self {
        let pretty = stderr_is_tty
            && match mode {
                UiMode::Pretty => true,
                UiMode::Auto => !report_on_tty,
                UiMode::Plain => false,
            };
        Self { pretty }
    }

    pub fn stage(&self, name: &str) -> Stage {
        let spinner = self.pretty.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!("{name}…"));
            spinner
        });
        if spinner.is_none() {
            eprintln!("==> {}", name);
        }
        Stage {
            name: name.to_string(),
            started: Instant::now(),
            spinner,
            outcome: None,
        }
    }
}

/// Running pipeline stage. Reports its outcome and elapsed time when dropped.
pub struct Stage {
    name: String,
    started: Instant,
    spinner: Option<ProgressBar>,
    outcome: Option<String>,
}

impl Stage {
    /// Short result shown on the completion line, e.g. `12 batches`.
    pub fn note(&mut self, outcome: impl Into<String>) {
        self.outcome = Some(outcome.into());
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        let elapsed = elapsed_label(self.started.elapsed());
        let message = match &self.outcome {
            Some(outcome) => format!("✔ {}: {} ({})", self.name, outcome, elapsed),
            None => format!("✔ {} ({})", self.name, elapsed),
        };
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

fn elapsed_label(elapsed: Duration) -> String {
    match elapsed.as_millis() {
        0 => "<1ms".to_string(),
        ms if ms < 1000 => format!("{}ms", ms),
        _ => format!("{:.2}s", elapsed.as_secs_f64()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_falls_back_to_auto() {
        assert_eq!(UiMode::parse("plain"), UiMode::Plain);
        assert_eq!(UiMode::parse("fancy"), UiMode::Auto);
    }

    #[test]
    fn spinners_need_a_terminal_and_a_free_stdout() {
        assert!(Ui::new(UiMode::Auto, true, false).pretty);
        assert!(!Ui::new(UiMode::Auto, true, true).pretty);
        assert!(Ui::new(UiMode::Pretty, true, true).pretty);
        assert!(!Ui::new(UiMode::Pretty, false, false).pretty);
    }

    #[test]
    fn elapsed_labels() {
        assert_eq!(elapsed_label(Duration::from_micros(300)), "<1ms");
        assert_eq!(elapsed_label(Duration::from_millis(42)), "42ms");
        assert_eq!(elapsed_label(Duration::from_millis(1250)), "1.25s");
    }
}
