// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Synthetic serving loop for exercising the instrumentation end to end.
//!
//! Each worker thread runs a small deterministic workload per step through
//! `Instrumentation::run_step`, exactly as a serving worker would.

use std::hint::black_box;
use std::thread;

use tracing::{error, info};

use crate::config;
use crate::timer::LatencySummary;
use crate::tracer::{DeviceStepStats, NodeExecStats, RunMetadata, StepStats};
use crate::{Instrumentation, RunMode, StepOutcome};

use super::{EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};

/// Outcome of a simulated serving run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub steps_run: u64,
    pub traced_steps: u64,
    pub failed_workers: usize,
    pub samples_taken: i64,
    pub summary: Option<LatencySummary>,
}

/// Load the environment config and run `threads * steps` synthetic steps.
pub fn run_simulate(threads: usize, steps: u64) -> i32 {
    let cfg = config::load();
    let instrumentation = match Instrumentation::from_config(&cfg) {
        Ok(i) => i,
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "instrumentation setup failed");
            eprintln!("Configuration error: {e}");
            return if e.is_fatal() { EXIT_CONFIG } else { EXIT_FAILURE };
        }
    };

    let report = simulate(&instrumentation, threads, steps);
    println!("steps_run={}", report.steps_run);
    println!("traced_steps={}", report.traced_steps);
    println!("samples_taken={}", report.samples_taken);
    match &report.summary {
        Some(summary) => println!("latency_ms={}", summary.to_csv()),
        None => println!("latency_ms="),
    }
    if report.failed_workers > 0 {
        eprintln!("{} worker(s) panicked", report.failed_workers);
        return EXIT_FAILURE;
    }
    EXIT_OK
}

/// Drive `threads` workers, each running `steps` steps.
pub fn simulate(instrumentation: &Instrumentation, threads: usize, steps: u64) -> SimulationReport {
    let threads = threads.max(1);

    let (traced_steps, failed_workers) = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|worker| scope.spawn(move || run_worker(instrumentation, worker, steps)))
            .collect();
        tally_workers(handles.into_iter().map(|h| h.join()))
    });

    let report = SimulationReport {
        steps_run: threads as u64 * steps,
        traced_steps,
        failed_workers,
        samples_taken: instrumentation.tracer.samples_taken(),
        summary: instrumentation.timer.summary(),
    };
    info!(
        threads,
        steps_run = report.steps_run,
        traced_steps = report.traced_steps,
        failed_workers = report.failed_workers,
        "simulation finished"
    );
    report
}

/// Sum traced steps over joined workers, counting the ones that panicked.
fn tally_workers<I>(results: I) -> (u64, usize)
where
    I: IntoIterator<Item = thread::Result<u64>>,
{
    let mut traced = 0;
    let mut failed = 0;
    for (worker, result) in results.into_iter().enumerate() {
        match result {
            Ok(n) => traced += n,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                    .unwrap_or("unknown panic");
                error!(worker, reason, "simulation worker panicked");
                failed += 1;
            }
        }
    }
    (traced, failed)
}

fn run_worker(instrumentation: &Instrumentation, worker: usize, steps: u64) -> u64 {
    let mut traced = 0;
    for step in 0..steps {
        let mode = instrumentation.run_step(|mode| execute(worker, step, mode));
        if mode == RunMode::FullTrace {
            traced += 1;
        }
    }
    traced
}

/// Stand-in for one model execution.
fn execute(worker: usize, step: u64, mode: RunMode) -> StepOutcome<RunMode> {
    let acc = (0..2048u64).fold(step, |acc, x| acc.wrapping_mul(31).wrapping_add(x));
    black_box(acc);

    match mode {
        RunMode::Plain => StepOutcome::plain(mode),
        RunMode::FullTrace => StepOutcome::traced(mode, synthetic_metadata(worker, step)),
    }
}

fn synthetic_metadata(worker: usize, step: u64) -> RunMetadata {
    let node = |name: &str, start: i64| NodeExecStats {
        node_name: name.to_string(),
        all_start_micros: start,
        all_end_rel_micros: 5,
        output_bytes: 4096,
    };
    RunMetadata {
        step_stats: StepStats {
            dev_stats: vec![DeviceStepStats {
                device: format!("/job:worker/task:{worker}/device:CPU:0"),
                node_stats: vec![node("embed", step as i64), node("matmul", step as i64 + 5)],
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_instrumentation_runs_plain() {
        let instrumentation = Instrumentation::new();
        let report = simulate(&instrumentation, 2, 50);
        assert_eq!(report.steps_run, 100);
        assert_eq!(report.traced_steps, 0);
        assert_eq!(report.failed_workers, 0);
        assert!(report.summary.is_none());
    }

    #[test]
    fn test_panicked_worker_is_counted() {
        let panic: Box<dyn std::any::Any + Send> = Box::new("worker blew up");
        let results = vec![Ok(3), Err(panic), Ok(2)];
        assert_eq!(tally_workers(results), (5, 1));
    }

    #[test]
    fn test_panicked_scoped_worker_is_counted() {
        let (traced, failed) = thread::scope(|scope| {
            let ok = scope.spawn(|| 4u64);
            let bad = scope.spawn(|| -> u64 { panic!("engine fault") });
            tally_workers([ok.join(), bad.join()])
        });
        assert_eq!((traced, failed), (4, 1));
    }

    #[test]
    fn test_simulation_samples_and_times() {
        let dir = tempfile::tempdir().unwrap();
        let instrumentation = Instrumentation::new();
        instrumentation
            .tracer
            .configure(crate::tracer::SamplerParams {
                start_step: 10,
                interval_step: 25,
                sample_count: 4,
                path: dir.path().join("timelines"),
            })
            .unwrap();
        std::fs::create_dir(dir.path().join("timelines")).unwrap();
        instrumentation
            .timer
            .enable(0, 20, dir.path().join("latency.csv"))
            .unwrap();

        let report = simulate(&instrumentation, 4, 100);

        assert_eq!(report.traced_steps, 4);
        assert_eq!(report.samples_taken, 4);
        assert_eq!(report.summary.unwrap().count, 20);
        for i in 0..4 {
            assert!(dir.path().join(format!("timelines/timeline-{i}")).exists());
        }
    }
}
