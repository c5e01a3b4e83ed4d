// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for the instrumentation binary.
//!
//! ## Usage
//!
//! ```bash
//! gg-instrument-cli config show       # Effective env configuration
//! gg-instrument-cli config validate   # Exit 2 on a misconfiguration
//! gg-instrument-cli simulate 4 10000  # Drive a synthetic serving loop
//! ```

pub mod config_cmd;
pub mod simulate;

pub use simulate::{run_simulate, simulate, SimulationReport};

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for a runtime failure.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for a configuration error.
pub const EXIT_CONFIG: i32 = 2;
