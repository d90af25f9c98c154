//! Timing helpers
//!
//! `Timer` measures a single module run; `Stopwatch` records the stages of an
//! orchestrated run.

use std::time::{Duration, Instant};

/// Measures the wall-clock time of one labelled operation
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    /// Create and start a new timer
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Stop timer and return elapsed time
    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        tracing::trace!("{} finished in {}ms", self.label, elapsed.as_millis());
        elapsed
    }
}

/// Stage stopwatch for a run
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    laps: Vec<(&'static str, Duration)>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            laps: Vec::new(),
        }
    }

    /// Mark the end of a stage
    pub fn lap(&mut self, stage: &'static str) {
        self.laps.push((stage, self.start.elapsed()));
    }

    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    /// Duration of each stage, not cumulative
    pub fn stage_times(&self) -> Vec<(&'static str, Duration)> {
        let mut prev = Duration::ZERO;
        self.laps
            .iter()
            .map(|(stage, cumulative)| {
                let lap = cumulative.saturating_sub(prev);
                prev = *cumulative;
                (*stage, lap)
            })
            .collect()
    }

    /// One-line `stage=Nms` rendering for logs
    pub fn format(&self) -> String {
        let mut parts: Vec<String> = self
            .stage_times()
            .into_iter()
            .map(|(stage, d)| format!("{}={}ms", stage, d.as_millis()))
            .collect();
        parts.push(format!("total={}ms", self.total().as_millis()));
        parts.join(" ")
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
