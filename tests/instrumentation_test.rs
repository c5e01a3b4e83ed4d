//! End-to-end tests of the serving-path gating in `Instrumentation::run_step`.

use std::path::PathBuf;

use gg_instrument::config::{InstrumentConfig, TimerConfig, TraceConfig};
use gg_instrument::tracer::{RunMetadata, StepStats};
use gg_instrument::{Instrumentation, RunMode, StepOutcome};

fn engine(mode: RunMode) -> StepOutcome<RunMode> {
    match mode {
        RunMode::Plain => StepOutcome::plain(mode),
        RunMode::FullTrace => StepOutcome::traced(
            mode,
            RunMetadata {
                step_stats: StepStats::default(),
            },
        ),
    }
}

#[test]
fn from_config_leaves_unset_sections_disabled() {
    let instrumentation = Instrumentation::from_config(&InstrumentConfig::default()).unwrap();
    assert!(!instrumentation.tracer.is_enabled());
    assert!(instrumentation.timer.window().is_none());

    for _ in 0..10 {
        assert_eq!(instrumentation.run_step(engine), RunMode::Plain);
    }
    assert_eq!(instrumentation.tracer.current_step(), 0);
}

#[test]
fn from_config_relative_trace_path_is_fatal() {
    let cfg = InstrumentConfig {
        trace: TraceConfig {
            count: 1,
            path: Some(PathBuf::from("relative/path")),
            ..TraceConfig::default()
        },
        ..InstrumentConfig::default()
    };
    let err = Instrumentation::from_config(&cfg).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("absolute"));
}

#[test]
fn sampled_steps_are_traced_and_others_timed() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = InstrumentConfig {
        trace: TraceConfig {
            start_step: 1,
            interval_step: 4,
            count: 2,
            path: Some(dir.path().to_path_buf()),
        },
        timer: TimerConfig {
            start: 0,
            count: 6,
            path: Some(dir.path().join("latency.csv")),
        },
    };
    let instrumentation = Instrumentation::from_config(&cfg).unwrap();

    let modes: Vec<RunMode> = (0..10).map(|_| instrumentation.run_step(engine)).collect();
    let traced: Vec<usize> = modes
        .iter()
        .enumerate()
        .filter(|(_, m)| **m == RunMode::FullTrace)
        .map(|(i, _)| i)
        .collect();

    assert_eq!(traced, vec![1, 5]);
    assert!(dir.path().join("timeline-0").exists());
    assert!(dir.path().join("timeline-1").exists());
    assert!(!dir.path().join("timeline-2").exists());

    // Eight untraced steps; the first six fill the window.
    assert_eq!(instrumentation.timer.recorded(), 6);
    let summary = std::fs::read_to_string(dir.path().join("latency.csv")).unwrap();
    assert_eq!(summary.split(',').count(), 4);
}

#[test]
fn failed_timeline_write_does_not_fail_step() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = InstrumentConfig {
        trace: TraceConfig {
            start_step: 0,
            interval_step: 1,
            count: 2,
            path: Some(dir.path().join("missing")),
        },
        ..InstrumentConfig::default()
    };
    let instrumentation = Instrumentation::from_config(&cfg).unwrap();

    assert_eq!(instrumentation.run_step(engine), RunMode::FullTrace);
    assert_eq!(instrumentation.run_step(engine), RunMode::FullTrace);
    assert_eq!(instrumentation.run_step(engine), RunMode::Plain);
    assert_eq!(instrumentation.tracer.samples_taken(), 2);
}

#[test]
fn shared_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = InstrumentConfig {
        trace: TraceConfig {
            start_step: 0,
            interval_step: 10,
            count: 5,
            path: Some(dir.path().to_path_buf()),
        },
        timer: TimerConfig::default(),
    };
    let instrumentation = std::sync::Arc::new(Instrumentation::from_config(&cfg).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let inst = instrumentation.clone();
            std::thread::spawn(move || {
                (0..100)
                    .filter(|_| inst.run_step(engine) == RunMode::FullTrace)
                    .count()
            })
        })
        .collect();
    let traced: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(traced, 5);
    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 5);
}
