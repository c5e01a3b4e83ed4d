//! gg-instrument CLI entry point.
//!
//! ## CLI Subcommands
//!
//! - `gg-instrument-cli config [show|defaults|validate]` - Inspect env config
//! - `gg-instrument-cli simulate [THREADS] [STEPS]` - Synthetic serving loop
//! - `gg-instrument-cli version` - Show version

use std::process::ExitCode;

use gg_instrument::cli::{config_cmd, run_simulate};
use gg_instrument::telemetry::{init_logging, LogConfig};

const DEFAULT_THREADS: usize = 4;
const DEFAULT_STEPS: u64 = 10_000;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    if let Err(e) = init_logging(&LogConfig::from_env()) {
        eprintln!("Logging disabled: {}", e);
    }

    match command {
        "simulate" => {
            let threads = parse_arg(&args, 2, DEFAULT_THREADS);
            let steps = parse_arg(&args, 3, DEFAULT_STEPS);
            ExitCode::from(run_simulate(threads, steps) as u8)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => ExitCode::from(config_cmd::run_validate() as u8),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_usage();
                    ExitCode::FAILURE
                }
            }
        }
        "version" | "--version" | "-V" => {
            println!("gg-instrument {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, default: T) -> T {
    args.get(index)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "gg-instrument - serving step tracing and latency windows v{}

USAGE:
    gg-instrument-cli [COMMAND] [OPTIONS]

COMMANDS:
    simulate [THREADS] [STEPS]   Run a synthetic serving loop (default 4 x 10000)
    config show                  Show effective configuration
    config defaults              Show documented defaults
    config validate              Validate configuration (exit 2 on error)
    version                      Show version information
    help                         Show this help message

ENVIRONMENT:
    GG_TRACE_START_STEP     First sampled step (default 0)
    GG_TRACE_INTERVAL_STEP  Steps between samples (default 1)
    GG_TRACE_COUNT          Number of samples (default 0)
    GG_TRACE_PATH           Absolute timeline directory (unset disables tracing)
    GG_TIMER_START          First timed call (default 0)
    GG_TIMER_COUNT          Timed calls in the window (default 0)
    GG_TIMER_PATH           Latency summary file (unset disables timing)
    GG_LOG_LEVEL            Log filter (default info)
    GG_LOG_FORMAT           json, pretty or compact (default json)
    GG_LOG_PATH             Log file (default stderr)

EXIT CODES:
    0  Success
    1  Failure
    2  Configuration error
",
        version
    );
}
