//! Log subscriber setup for binaries embedding the instrumentation.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the process that owns `main`.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

impl LogFormat {
    /// Parse a format name as used in `GG_LOG_FORMAT`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info` or `gg_instrument=debug`.
    pub level: String,
    /// Log file. Logs go to stderr when unset.
    pub output_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
            output_path: None,
        }
    }
}

impl LogConfig {
    /// Read `GG_LOG_LEVEL`, `GG_LOG_FORMAT` and `GG_LOG_PATH`.
    ///
    /// Unknown formats fall back to JSON.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            format: std::env::var("GG_LOG_FORMAT")
                .ok()
                .and_then(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            level: std::env::var("GG_LOG_LEVEL").unwrap_or(defaults.level),
            output_path: std::env::var_os("GG_LOG_PATH").map(PathBuf::from),
        }
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Failed to open log file: {0}")]
    FileOpen(String),
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter =
        EnvFilter::try_new(&config.level).map_err(|e| LogError::InvalidFilter(e.to_string()))?;
    let writer = make_writer(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(writer))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(writer))
            .try_init(),
    };
    result.map_err(|_| LogError::AlreadyInitialized)
}

fn make_writer(config: &LogConfig) -> Result<BoxMakeWriter, LogError> {
    match &config.output_path {
        Some(path) => {
            let file = File::create(path).map_err(|e| LogError::FileOpen(e.to_string()))?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
        None => Ok(BoxMakeWriter::new(std::io::stderr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" pretty "), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("xml"), None);
        for format in [LogFormat::Json, LogFormat::Pretty, LogFormat::Compact] {
            assert_eq!(LogFormat::parse(format.as_str()), Some(format));
        }
    }

    #[test]
    fn test_invalid_filter_rejected_before_install() {
        let config = LogConfig {
            level: "gg_instrument=notalevel".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(init_logging(&config), Err(LogError::InvalidFilter(_))));
    }

    #[test]
    fn test_unwritable_log_file_reported() {
        let config = LogConfig {
            output_path: Some(PathBuf::from("/nonexistent-dir/gg/instrument.log")),
            ..LogConfig::default()
        };
        assert!(matches!(init_logging(&config), Err(LogError::FileOpen(_))));
    }
}
