//! GG-CORE serving instrumentation
//!
//! Two cheap, in-process diagnostics consulted inline by the serving path:
//!
//! - **Trace sampling**: decides per serving step whether the step runs with
//!   full execution tracing, and writes the captured trace to a timeline file.
//! - **Latency collection**: times a fixed window of calls after a warm-up
//!   offset and writes `mean,stddev,max,min` once the window is full.
//!
//! Both live in one [`Instrumentation`] context built once at startup and
//! shared by reference with every serving thread. All work happens on the
//! calling thread; there are no background tasks.

pub mod cli;
pub mod config;
pub mod telemetry;
pub mod timer;
pub mod tracer;

use thiserror::Error;
use tracing::debug;

use config::InstrumentConfig;
use timer::{LatencyCollector, TimerError};
use tracer::{RunMetadata, StepDecision, TraceError, TraceSampler};

/// Errors building the instrumentation context.
#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Timer(#[from] TimerError),
}

impl InstrumentError {
    /// Returns true if startup should be refused.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Trace(e) => e.is_fatal(),
            Self::Timer(e) => !matches!(e, TimerError::Io { .. }),
        }
    }
}

/// How the engine should execute a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Normal execution.
    Plain,
    /// Execution with full step tracing; the engine returns `RunMetadata`.
    FullTrace,
}

/// Result of one engine execution.
#[derive(Debug)]
pub struct StepOutcome<R> {
    pub output: R,
    /// Present when the step ran with `RunMode::FullTrace`.
    pub metadata: Option<RunMetadata>,
}

impl<R> StepOutcome<R> {
    pub fn plain(output: R) -> Self {
        Self {
            output,
            metadata: None,
        }
    }

    pub fn traced(output: R, metadata: RunMetadata) -> Self {
        Self {
            output,
            metadata: Some(metadata),
        }
    }
}

/// Process-wide instrumentation context.
#[derive(Debug, Default)]
pub struct Instrumentation {
    pub tracer: TraceSampler,
    pub timer: LatencyCollector,
}

impl Instrumentation {
    /// Context with both components disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and configure both components from `config`.
    ///
    /// Sections without an output path stay disabled.
    pub fn from_config(config: &InstrumentConfig) -> Result<Self, InstrumentError> {
        let instrumentation = Self::new();
        if let Some(params) = config.trace.sampler_params() {
            instrumentation.tracer.configure(params)?;
        }
        if let Some((start, count, path)) = config.timer.window() {
            instrumentation.timer.enable(start, count, path)?;
        }
        Ok(instrumentation)
    }

    /// Run one serving step with tracing or timing as scheduled.
    ///
    /// A sampled step runs in `RunMode::FullTrace` and is excluded from
    /// timing. A failed timeline write does not fail the step.
    pub fn run_step<R, F>(&self, run: F) -> R
    where
        F: FnOnce(RunMode) -> StepOutcome<R>,
    {
        if let Some(StepDecision { step, sample: true }) = self.tracer.evaluate() {
            debug!(step, "running step with full trace");
            let outcome = run(RunMode::FullTrace);
            if let Some(metadata) = &outcome.metadata {
                // Logged by the sampler; the step result is unaffected.
                let _ = self.tracer.record_step(metadata);
            }
            return outcome.output;
        }

        if self.timer.is_enabled() {
            let started = self.timer.start();
            let outcome = run(RunMode::Plain);
            self.timer.stop(started);
            return outcome.output;
        }

        run(RunMode::Plain).output
    }
}
