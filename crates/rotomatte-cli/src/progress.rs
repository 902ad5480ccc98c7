use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use rotomatte_core::pipeline::{ProgressReporter, StageReport};

/// Progress reporter that draws one indicatif bar per stage.
pub struct BarReporter {
    style: ProgressStyle,
    bar: Mutex<Option<ProgressBar>>,
}

impl BarReporter {
    pub fn new() -> anyhow::Result<Self> {
        let style = ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> ");
        Ok(Self {
            style,
            bar: Mutex::new(None),
        })
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: &str, total_items: Option<usize>) {
        let pb = ProgressBar::new(total_items.unwrap_or(0) as u64);
        pb.set_style(self.style.clone());
        pb.set_message(stage.to_string());
        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn advance(&self, items_done: usize) {
        if let Ok(bar) = self.bar.lock() {
            if let Some(ref pb) = *bar {
                // Workers finish out of order; never move the bar backwards.
                if items_done as u64 > pb.position() {
                    pb.set_position(items_done as u64);
                }
            }
        }
    }

    fn finish_stage(&self, report: &StageReport) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(pb) = bar.take() {
                let msg = if report.aborted {
                    format!("{} (no input)", report.stage)
                } else {
                    report.stage.clone()
                };
                pb.finish_with_message(msg);
            }
        }
    }
}
