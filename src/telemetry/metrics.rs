//! Counters published through the `metrics` facade.
//!
//! Without an installed recorder these are no-ops.

/// Counter of fired trace samples.
pub const TRACE_SAMPLES_TOTAL: &str = "gg_trace_samples_total";
/// Counter of failed timeline writes.
pub const TRACE_WRITE_FAILURES_TOTAL: &str = "gg_trace_write_failures_total";
/// Counter of latency summaries flushed.
pub const LATENCY_FLUSHES_TOTAL: &str = "gg_latency_flushes_total";
/// Counter of stop calls rejected because the window was full.
pub const LATENCY_OVERRUNS_TOTAL: &str = "gg_latency_overruns_total";

pub fn record_trace_sample() {
    metrics::counter!(TRACE_SAMPLES_TOTAL).increment(1);
}

pub fn record_trace_write_failure() {
    metrics::counter!(TRACE_WRITE_FAILURES_TOTAL).increment(1);
}

pub fn record_latency_flush() {
    metrics::counter!(LATENCY_FLUSHES_TOTAL).increment(1);
}

pub fn record_latency_overrun() {
    metrics::counter!(LATENCY_OVERRUNS_TOTAL).increment(1);
}
