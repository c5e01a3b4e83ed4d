// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables.

use crate::config::{self, EffectiveConfig, InstrumentConfig};
use crate::tracer::normalize_dir;

use super::{EXIT_CONFIG, EXIT_OK};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    for line in render_config(&cfg) {
        println!("{line}");
    }
}

/// Print documented defaults to stdout.
pub fn run_defaults() {
    println!("GG_TRACE_START_STEP=0");
    println!("GG_TRACE_INTERVAL_STEP=1");
    println!("GG_TRACE_COUNT=0");
    println!("GG_TRACE_PATH=");
    println!("GG_TIMER_START=0");
    println!("GG_TIMER_COUNT=0");
    println!("GG_TIMER_PATH=");
}

/// Validate the environment configuration.
///
/// Returns 0 if valid, 2 if the configuration would be refused at startup.
pub fn run_validate() -> i32 {
    let problems = validate(&config::load());
    if problems.is_empty() {
        println!("Configuration is valid.");
        EXIT_OK
    } else {
        for problem in &problems {
            eprintln!("ERROR: {problem}");
        }
        EXIT_CONFIG
    }
}

/// Collect startup-blocking problems in `cfg`.
pub fn validate(cfg: &InstrumentConfig) -> Vec<String> {
    let mut problems = Vec::new();

    if let Some(params) = cfg.trace.sampler_params() {
        if let Err(e) = normalize_dir(params.path.clone()) {
            problems.push(format!("GG_TRACE_PATH: {e}"));
        }
        if let Err(e) = params.limit_step() {
            problems.push(format!("GG_TRACE_*: {e}"));
        }
        if params.sample_count == 0 {
            problems.push("GG_TRACE_PATH is set but GG_TRACE_COUNT is 0".to_string());
        }
    }
    if cfg.timer.path.is_some() && cfg.timer.count == 0 {
        problems.push("GG_TIMER_PATH is set but GG_TIMER_COUNT is 0".to_string());
    }

    problems
}

fn render_config(cfg: &EffectiveConfig) -> Vec<String> {
    let path = |p: &Option<std::path::PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    };
    vec![
        format!("trace.enabled={}", cfg.trace_enabled),
        format!("GG_TRACE_START_STEP={}", cfg.trace_start_step),
        format!("GG_TRACE_INTERVAL_STEP={}", cfg.trace_interval_step),
        format!("GG_TRACE_COUNT={}", cfg.trace_count),
        format!("GG_TRACE_PATH={}", path(&cfg.trace_path)),
        format!("timer.enabled={}", cfg.timer_enabled),
        format!("GG_TIMER_START={}", cfg.timer_start),
        format!("GG_TIMER_COUNT={}", cfg.timer_count),
        format!("GG_TIMER_PATH={}", path(&cfg.timer_path)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TimerConfig, TraceConfig};
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&InstrumentConfig::default()).is_empty());
    }

    #[test]
    fn test_relative_trace_path_is_reported() {
        let cfg = InstrumentConfig {
            trace: TraceConfig {
                count: 3,
                path: Some(PathBuf::from("relative/path")),
                ..TraceConfig::default()
            },
            ..InstrumentConfig::default()
        };
        let problems = validate(&cfg);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("absolute"));
    }

    #[test]
    fn test_zero_interval_is_reported() {
        let cfg = InstrumentConfig {
            trace: TraceConfig {
                start_step: 0,
                interval_step: 0,
                count: 4,
                path: Some(PathBuf::from("/tmp/traces")),
            },
            ..InstrumentConfig::default()
        };
        let problems = validate(&cfg);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("interval_step must be >= 1"));
    }

    #[test]
    fn test_zero_counts_are_reported() {
        let cfg = InstrumentConfig {
            trace: TraceConfig {
                path: Some(PathBuf::from("/tmp/traces")),
                ..TraceConfig::default()
            },
            timer: TimerConfig {
                start: 0,
                count: 0,
                path: Some(PathBuf::from("/tmp/latency.csv")),
            },
        };
        assert_eq!(validate(&cfg).len(), 2);
    }

    #[test]
    fn test_render_includes_all_fields() {
        let cfg = InstrumentConfig {
            trace: TraceConfig {
                start_step: 7,
                interval_step: 3,
                count: 2,
                path: Some(PathBuf::from("/tmp/traces")),
            },
            ..InstrumentConfig::default()
        };
        let lines = render_config(&cfg.effective_config());
        assert_eq!(lines.len(), 9);
        assert!(lines.contains(&"trace.enabled=true".to_string()));
        assert!(lines.contains(&"GG_TRACE_START_STEP=7".to_string()));
        assert!(lines.contains(&"GG_TRACE_PATH=/tmp/traces".to_string()));
        assert!(lines.contains(&"GG_TIMER_PATH=".to_string()));
    }
}
