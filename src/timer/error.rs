use std::path::PathBuf;

use thiserror::Error;

/// Errors from the latency collector.
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("Invalid latency window: {0}")]
    InvalidWindow(String),

    #[error("Latency collector already enabled")]
    AlreadyConfigured,

    #[error("Failed to write latency summary {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
