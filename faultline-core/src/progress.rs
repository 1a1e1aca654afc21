//! Progress reporting for pipeline stages.
//!
//! The CLI uses `IndicatifReporter` for a stage counter on stderr.
//! Library callers can use `NoopReporter` or provide their own implementation.

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

use crate::analyze::StageStats;

/// Trait for reporting progress through the pipeline's stages.
///
/// Concurrent stages may report from different threads.
pub trait ProgressReporter: Send + Sync {
    /// Announce the number of stages in this run.
    fn begin(&self, stages: u64);

    /// A stage started.
    fn stage_started(&self, stage: &str);

    /// A stage finished with the given statistics.
    fn stage_finished(&self, stats: &StageStats);

    /// The whole run finished.
    fn finish(&self);

    /// Display an informational message.
    fn message(&self, msg: &str);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn begin(&self, _stages: u64) {}
    fn stage_started(&self, _stage: &str) {}
    fn stage_finished(&self, _stats: &StageStats) {}
    fn finish(&self) {}
    fn message(&self, _msg: &str) {}
}

/// Reporter backed by an `indicatif` progress bar for CLI use.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
    completed: AtomicU64,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    /// A reporter that tracks progress without drawing anything.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len} stages ({elapsed})",
        )
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self {
            bar,
            completed: AtomicU64::new(0),
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for IndicatifReporter {
    fn begin(&self, stages: u64) {
        self.completed.store(0, Ordering::Relaxed);
        self.bar.set_length(stages);
        self.bar.reset();
    }

    fn stage_started(&self, stage: &str) {
        self.bar.set_message(stage.to_string());
    }

    fn stage_finished(&self, stats: &StageStats) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.bar.inc(1);
        self.bar.set_message(format!("{} done", stats.stage));
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }
}
