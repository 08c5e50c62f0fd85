use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use atlasreg_registration::{Stage, StageCallback};

/// Terminal progress bar advanced once per completed stage.
#[derive(Clone)]
pub struct SpinnerCallback {
    bar: ProgressBar,
}

impl SpinnerCallback {
    pub fn new(stages: u64, tick: Duration) -> anyhow::Result<Self> {
        let bar = ProgressBar::new(stages);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:20.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        bar.enable_steady_tick(tick);
        Ok(Self { bar })
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Registration complete");
    }
}

impl StageCallback for SpinnerCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(stage.to_string());
    }

    fn on_stage_complete(&self, _stage: Stage, _elapsed: Duration) {
        self.bar.inc(1);
    }

    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.bar.abandon_with_message(format!("{} failed", stage));
    }
}
