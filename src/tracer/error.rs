//! Trace sampler error types.
//!
//! Configuration errors are fatal for the embedding process; write errors only
//! lose the affected step.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring the sampler or writing timelines.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Trace path must be an absolute local path: {}", .0.display())]
    RelativePath(PathBuf),

    #[error("Invalid sampler parameter: {0}")]
    InvalidParameter(String),

    #[error("Trace sampler already configured")]
    AlreadyConfigured,

    #[error("Trace sampler not configured")]
    NotConfigured,

    #[error("Failed to encode trace payload: {0}")]
    Encode(String),

    #[error("Failed to write timeline {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TraceError {
    /// Returns true if this error indicates a misconfigured deployment.
    ///
    /// The embedding process is expected to refuse to start on these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RelativePath(_) | Self::InvalidParameter(_) | Self::AlreadyConfigured
        )
    }
}

impl From<serde_json::Error> for TraceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e.to_string())
    }
}
