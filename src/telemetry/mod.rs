//! Telemetry for the instrumentation itself.
//!
//! Structured logging setup, the span around timeline writes, and counters
//! published through the `metrics` facade.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use self::metrics::{
    record_latency_flush, record_latency_overrun, record_trace_sample,
    record_trace_write_failure, LATENCY_FLUSHES_TOTAL, LATENCY_OVERRUNS_TOTAL,
    TRACE_SAMPLES_TOTAL, TRACE_WRITE_FAILURES_TOTAL,
};
pub use spans::{SpanExt, StepSpan};
