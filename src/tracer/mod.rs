//! Step trace sampling for the serving path.
//!
//! The sampler answers, once per serving step, whether that step should run
//! with full execution tracing. Samples fire at steps `start, start + interval,
//! ...` until the budget is spent. After that, and whenever the sampler was
//! never configured, the check costs a single load.

mod error;
mod payload;
mod timeline;

pub use error::TraceError;
pub use payload::{DeviceStepStats, NodeExecStats, RunMetadata, StepStats, TracePayload};
pub use timeline::{normalize_dir, TimelineWriter, TIMELINE_PREFIX};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::telemetry::{self, SpanExt, StepSpan};

/// Sampling parameters supplied once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerParams {
    /// First step that is sampled.
    pub start_step: i64,
    /// Steps between consecutive samples.
    pub interval_step: i64,
    /// Maximum number of samples ever taken.
    pub sample_count: i64,
    /// Absolute directory receiving timeline files.
    pub path: PathBuf,
}

impl SamplerParams {
    /// Check parameters and compute the step after which sampling stops.
    pub fn limit_step(&self) -> Result<i64, TraceError> {
        if self.start_step < 0 {
            return Err(TraceError::InvalidParameter(format!(
                "start_step must be >= 0, got {}",
                self.start_step
            )));
        }
        if self.interval_step < 1 {
            return Err(TraceError::InvalidParameter(format!(
                "interval_step must be >= 1, got {}",
                self.interval_step
            )));
        }
        if self.sample_count < 0 {
            return Err(TraceError::InvalidParameter(format!(
                "sample_count must be >= 0, got {}",
                self.sample_count
            )));
        }
        self.interval_step
            .checked_mul(self.sample_count)
            .and_then(|span| span.checked_add(self.start_step))
            .ok_or_else(|| {
                TraceError::InvalidParameter("sampling window overflows i64".to_string())
            })
    }
}

/// Outcome of evaluating one serving step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDecision {
    /// Step index consumed by this call.
    pub step: i64,
    /// Whether this step is traced.
    pub sample: bool,
}

/// Resolved schedule, present only once configured.
#[derive(Debug)]
struct Schedule {
    params: SamplerParams,
    limit_step: i64,
    next_sample_step: AtomicI64,
    samples_taken: AtomicI64,
    advance: Mutex<()>,
    writer: TimelineWriter,
}

impl Schedule {
    /// Whether `step` is one of the scheduled sample steps.
    fn is_sample_step(&self, step: i64) -> bool {
        step >= self.params.start_step
            && step < self.limit_step
            && (step - self.params.start_step) % self.params.interval_step == 0
    }
}

/// Decides which serving steps get a full execution trace.
#[derive(Debug, Default)]
pub struct TraceSampler {
    schedule: OnceLock<Schedule>,
    current_step: AtomicI64,
}

impl TraceSampler {
    /// Create an unconfigured sampler. `should_sample` returns false until
    /// `configure` succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sampler configured with `params`.
    pub fn with_params(params: SamplerParams) -> Result<Self, TraceError> {
        let sampler = Self::new();
        sampler.configure(params)?;
        Ok(sampler)
    }

    /// One-time setup.
    ///
    /// A relative path or invalid parameter leaves the sampler untouched.
    /// A second call fails with `AlreadyConfigured`.
    pub fn configure(&self, params: SamplerParams) -> Result<(), TraceError> {
        if self.schedule.get().is_some() {
            return Err(TraceError::AlreadyConfigured);
        }
        let writer = TimelineWriter::new(params.path.clone())?;
        let limit_step = params.limit_step()?;

        let schedule = Schedule {
            next_sample_step: AtomicI64::new(params.start_step),
            samples_taken: AtomicI64::new(0),
            advance: Mutex::new(()),
            limit_step,
            writer,
            params,
        };
        self.schedule
            .set(schedule)
            .map_err(|_| TraceError::AlreadyConfigured)?;

        if let Some(s) = self.schedule.get() {
            info!(
                enabled = true,
                next_tracing_step = s.params.start_step,
                interval_step = s.params.interval_step,
                tracing_count = s.params.sample_count,
                limit_step = s.limit_step,
                dir = %s.writer.dir().display(),
                "trace sampler configured"
            );
        }
        Ok(())
    }

    /// Whether sampling was configured.
    pub fn is_enabled(&self) -> bool {
        self.schedule.get().is_some()
    }

    /// Evaluate the current step. Call exactly once per serving step.
    ///
    /// Every call past the disabled and exhausted checks consumes one step
    /// index, so concurrent callers never observe the same step.
    #[inline]
    pub fn should_sample(&self) -> bool {
        matches!(self.evaluate(), Some(StepDecision { sample: true, .. }))
    }

    /// Like `should_sample`, but also reports the step index consumed.
    ///
    /// Returns `None` when no index was consumed (unconfigured or exhausted).
    #[inline]
    pub fn evaluate(&self) -> Option<StepDecision> {
        let schedule = self.schedule.get()?;
        if self.current_step.load(Ordering::Relaxed) >= schedule.limit_step {
            return None;
        }

        let step = self.current_step.fetch_add(1, Ordering::Relaxed);
        if !schedule.is_sample_step(step) {
            return Some(StepDecision { step, sample: false });
        }

        let _guard = schedule.advance.lock();
        schedule
            .next_sample_step
            .fetch_add(schedule.params.interval_step, Ordering::Relaxed);
        schedule.samples_taken.fetch_add(1, Ordering::Relaxed);
        telemetry::record_trace_sample();
        Some(StepDecision { step, sample: true })
    }

    /// Write one sampled step's trace to a new timeline file.
    ///
    /// Failures are logged and returned; they never affect later steps.
    pub fn record_step<P>(&self, payload: &P) -> Result<PathBuf, TraceError>
    where
        P: TracePayload + ?Sized,
    {
        let schedule = self.schedule.get().ok_or(TraceError::NotConfigured)?;
        let current_step = self.current_step();
        let span = StepSpan::new(current_step, schedule.writer.dir());
        let _enter = span.enter();

        let result = payload
            .encode()
            .and_then(|bytes| schedule.writer.write(&bytes));
        span.record_result(&result);

        match result {
            Ok((index, path)) => {
                span.record("timeline_index", index);
                debug!(current_step, index, path = %path.display(), "timeline written");
                Ok(path)
            }
            Err(e) => {
                telemetry::record_trace_write_failure();
                warn!(current_step, error = %e, "failed to write timeline");
                Err(e)
            }
        }
    }

    /// Number of step indices consumed so far.
    pub fn current_step(&self) -> i64 {
        self.current_step.load(Ordering::Relaxed)
    }

    /// Step at which the next sample fires, if configured.
    pub fn next_sample_step(&self) -> Option<i64> {
        self.schedule
            .get()
            .map(|s| s.next_sample_step.load(Ordering::Relaxed))
    }

    /// Number of samples that fired.
    pub fn samples_taken(&self) -> i64 {
        self.schedule
            .get()
            .map(|s| s.samples_taken.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Step index beyond which sampling never fires, if configured.
    pub fn limit_step(&self) -> Option<i64> {
        self.schedule.get().map(|s| s.limit_step)
    }

    /// Resolved parameters, if configured.
    pub fn params(&self) -> Option<&SamplerParams> {
        self.schedule.get().map(|s| &s.params)
    }

    /// Normalized output directory, if configured.
    pub fn output_dir(&self) -> Option<&Path> {
        self.schedule.get().map(|s| s.writer.dir())
    }
}
