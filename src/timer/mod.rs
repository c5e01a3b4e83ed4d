//! Warm-up-then-measure latency collection.
//!
//! Calls are numbered by `is_enabled`; the ones whose index falls inside
//! `[start, start + count)` are timed. Completed regions fill a fixed buffer of
//! `count` slots, and the region that completes the last slot writes the
//! summary file. Everything runs on the caller's thread.

mod error;
mod summary;

pub use error::TimerError;
pub use summary::{LatencySummary, SUMMARY_PRECISION};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use tracing::{info, warn};

use crate::telemetry;

/// Measurement window, allocated once by `enable`.
#[derive(Debug)]
struct Window {
    start: i64,
    count: i64,
    path: PathBuf,
    call_index: AtomicI64,
    slot_index: AtomicI64,
    filled: AtomicI64,
    // f64 bits stored as u64
    samples: Box<[AtomicU64]>,
    summary: OnceLock<LatencySummary>,
}

impl Window {
    fn contains(&self, index: i64) -> bool {
        index >= self.start && index - self.start < self.count
    }

    fn flush(&self) -> Result<LatencySummary, TimerError> {
        let values: Vec<f64> = self
            .samples
            .iter()
            .map(|slot| f64::from_bits(slot.load(Ordering::Relaxed)))
            .collect();
        let summary = LatencySummary::from_samples(&values)
            .ok_or_else(|| TimerError::InvalidWindow("empty window".to_string()))?;
        let summary = *self.summary.get_or_init(|| summary);

        std::fs::write(&self.path, summary.to_csv()).map_err(|source| TimerError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(summary)
    }
}

/// Records elapsed time for a bounded window of operations.
#[derive(Debug, Default)]
pub struct LatencyCollector {
    window: OnceLock<Window>,
    active: AtomicBool,
}

impl LatencyCollector {
    /// Create a collector that accepts nothing until `enable`.
    pub fn new() -> Self {
        Self::default()
    }

    /// One-time setup: time calls `[start, start + count)` and write the
    /// summary to `output_path`.
    pub fn enable(
        &self,
        start: i64,
        count: i64,
        output_path: impl Into<PathBuf>,
    ) -> Result<(), TimerError> {
        if self.window.get().is_some() {
            return Err(TimerError::AlreadyConfigured);
        }
        if start < 0 {
            return Err(TimerError::InvalidWindow(format!(
                "start must be >= 0, got {start}"
            )));
        }
        if count < 1 {
            return Err(TimerError::InvalidWindow(format!(
                "count must be >= 1, got {count}"
            )));
        }
        let slots = usize::try_from(count)
            .map_err(|_| TimerError::InvalidWindow(format!("count {count} too large")))?;
        if start.checked_add(count).is_none() {
            return Err(TimerError::InvalidWindow(
                "window end overflows i64".to_string(),
            ));
        }

        let window = Window {
            start,
            count,
            path: output_path.into(),
            call_index: AtomicI64::new(0),
            slot_index: AtomicI64::new(0),
            filled: AtomicI64::new(0),
            samples: (0..slots).map(|_| AtomicU64::new(0)).collect(),
            summary: OnceLock::new(),
        };
        self.window
            .set(window)
            .map_err(|_| TimerError::AlreadyConfigured)?;
        self.active.store(start == 0, Ordering::Relaxed);

        info!(start, count, path = ?self.output_path(), "latency collector enabled");
        Ok(())
    }

    /// Stop accepting recordings. Collected samples are kept.
    pub fn disable(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    /// Number the current call and report whether it falls in the window.
    pub fn is_enabled(&self) -> bool {
        let Some(window) = self.window.get() else {
            return false;
        };
        let index = window.call_index.fetch_add(1, Ordering::Relaxed);
        let active = window.contains(index);
        self.active.store(active, Ordering::Relaxed);
        active
    }

    /// Last eligibility decision, without consuming a call index.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Monotonic start of a timed region.
    #[inline]
    pub fn start(&self) -> Instant {
        Instant::now()
    }

    /// End a timed region started at `started` and record it.
    ///
    /// Calls beyond the window deactivate the collector and record nothing.
    pub fn stop(&self, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.record(elapsed_ms);
    }

    /// Store one elapsed value in the next free slot.
    ///
    /// `stop` is the usual entry point; this takes a precomputed value.
    pub fn record(&self, elapsed_ms: f64) {
        let Some(window) = self.window.get() else {
            return;
        };
        let slot = window.slot_index.fetch_add(1, Ordering::Relaxed);
        if slot >= window.count {
            self.active.store(false, Ordering::Relaxed);
            telemetry::record_latency_overrun();
            return;
        }
        // slot < count, which fits in usize
        window.samples[slot as usize].store(elapsed_ms.to_bits(), Ordering::Relaxed);

        // The store above is published by this increment; the caller that
        // completes the last slot sees every sample.
        let completed = window.filled.fetch_add(1, Ordering::AcqRel) + 1;
        if completed == window.count {
            match window.flush() {
                Ok(summary) => {
                    telemetry::record_latency_flush();
                    info!(
                        mean = summary.mean,
                        stddev = summary.stddev,
                        max = summary.max,
                        min = summary.min,
                        path = %window.path.display(),
                        "latency summary written"
                    );
                }
                Err(e) => warn!(error = %e, "failed to write latency summary"),
            }
        }
    }

    /// Eligibility-checked guard that records on drop.
    pub fn scope(&self) -> Option<LatencyScope<'_>> {
        if self.is_enabled() {
            Some(LatencyScope {
                collector: self,
                started: self.start(),
            })
        } else {
            None
        }
    }

    /// Configured `(start, count)`.
    pub fn window(&self) -> Option<(i64, i64)> {
        self.window.get().map(|w| (w.start, w.count))
    }

    /// Number of slots written so far.
    pub fn recorded(&self) -> i64 {
        self.window
            .get()
            .map(|w| w.filled.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Summary of the full window, once computed.
    pub fn summary(&self) -> Option<LatencySummary> {
        self.window.get().and_then(|w| w.summary.get().copied())
    }

    /// Summary file path, if enabled.
    pub fn output_path(&self) -> Option<&Path> {
        self.window.get().map(|w| w.path.as_path())
    }
}

/// Times the region between `LatencyCollector::scope` and drop.
#[must_use = "the region is timed until the guard is dropped"]
pub struct LatencyScope<'a> {
    collector: &'a LatencyCollector,
    started: Instant,
}

impl Drop for LatencyScope<'_> {
    fn drop(&mut self) {
        self.collector.stop(self.started);
    }
}
