//! Span utilities for sampled-step trace writes.

use std::path::Path;

use tracing::{info_span, Span};

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for the span wrapping one timeline write.
pub struct StepSpan;

impl StepSpan {
    /// Create a span for writing a sampled step's trace.
    ///
    /// `timeline_index`, `status` and `error.message` are filled in once the
    /// write completes.
    pub fn new(current_step: i64, dir: &Path) -> Span {
        info_span!(
            "trace_sample",
            current_step,
            dir = %dir.display(),
            timeline_index = tracing::field::Empty,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
