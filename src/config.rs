//! Instrumentation configuration from environment variables or TOML.
//!
//! Numeric values that are missing or unparsable fall back to defaults
//! without crashing. Trace values are passed through as given; the sampler
//! rejects a zero interval, a negative value or a relative path with a typed
//! error at startup.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `GG_TRACE_START_STEP` | 0 | First sampled step |
//! | `GG_TRACE_INTERVAL_STEP` | 1 | Steps between samples; must be >= 1 |
//! | `GG_TRACE_COUNT` | 0 | Number of samples to take |
//! | `GG_TRACE_PATH` | unset | Timeline directory; unset disables tracing |
//! | `GG_TIMER_START` | 0 | First timed call index |
//! | `GG_TIMER_COUNT` | 0 | Timed calls in the window; 0 disables timing |
//! | `GG_TIMER_PATH` | unset | Summary file; unset disables timing |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tracer::SamplerParams;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(String),
}

/// Trace sampler section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub start_step: i64,
    pub interval_step: i64,
    pub count: i64,
    pub path: Option<PathBuf>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            start_step: 0,
            interval_step: 1,
            count: 0,
            path: None,
        }
    }
}

impl TraceConfig {
    /// Sampler parameters, or `None` when tracing is not requested.
    pub fn sampler_params(&self) -> Option<SamplerParams> {
        self.path.as_ref().map(|path| SamplerParams {
            start_step: self.start_step,
            interval_step: self.interval_step,
            sample_count: self.count,
            path: path.clone(),
        })
    }
}

/// Latency collector section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub start: i64,
    pub count: i64,
    pub path: Option<PathBuf>,
}

impl TimerConfig {
    /// `(start, count, path)` when timing is requested.
    pub fn window(&self) -> Option<(i64, i64, &Path)> {
        match &self.path {
            Some(path) if self.count > 0 => Some((self.start, self.count, path.as_path())),
            _ => None,
        }
    }
}

/// Full instrumentation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub trace: TraceConfig,
    pub timer: TimerConfig,
}

/// Flat summary of effective values, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub trace_enabled: bool,
    pub trace_start_step: i64,
    pub trace_interval_step: i64,
    pub trace_count: i64,
    pub trace_path: Option<PathBuf>,
    pub timer_enabled: bool,
    pub timer_start: i64,
    pub timer_count: i64,
    pub timer_path: Option<PathBuf>,
}

/// Parse an `i64` env var, returning `default` on missing or invalid.
fn parse_i64(key: &str, default: i64) -> i64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<i64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Read a path env var; empty values count as unset.
fn parse_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn load_trace_config() -> TraceConfig {
    TraceConfig {
        start_step: parse_i64("GG_TRACE_START_STEP", 0),
        interval_step: parse_i64("GG_TRACE_INTERVAL_STEP", 1),
        count: parse_i64("GG_TRACE_COUNT", 0),
        path: parse_path("GG_TRACE_PATH"),
    }
}

fn load_timer_config() -> TimerConfig {
    let start = parse_i64("GG_TIMER_START", 0).max(0);
    let count = parse_i64("GG_TIMER_COUNT", 0).max(0);
    TimerConfig {
        start,
        count,
        path: parse_path("GG_TIMER_PATH"),
    }
}

/// Load configuration from environment variables.
pub fn load() -> InstrumentConfig {
    InstrumentConfig {
        trace: load_trace_config(),
        timer: load_timer_config(),
    }
}

impl InstrumentConfig {
    /// Parse a TOML document with `[trace]` and `[timer]` tables.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Return a flat summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            trace_enabled: self.trace.path.is_some(),
            trace_start_step: self.trace.start_step,
            trace_interval_step: self.trace.interval_step,
            trace_count: self.trace.count,
            trace_path: self.trace.path.clone(),
            timer_enabled: self.timer.window().is_some(),
            timer_start: self.timer.start,
            timer_count: self.timer.count,
            timer_path: self.timer.path.clone(),
        }
    }
}
