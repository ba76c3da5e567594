//! # hbench-timing
//!
//! Timing and calibration core for OS and hardware microbenchmarks.
//!
//! A benchmark program supplies a workload ("run N repetitions"); this
//! crate turns it into one overhead-corrected number:
//! - a clock source chosen once at startup (wall clock, cycle counter, or
//!   cycle counter with auxiliary hardware event counters)
//! - a one-time calibration of the start/stop bracket overhead
//! - an adaptive search for the repetition count that makes the workload
//!   run for about a second
//! - canonical bandwidth (MB/s) and latency (us/iter) output lines
//!
//! ## Quick Start
//!
//! ```ignore
//! use hbench_timing::{args, output, Bracketed, Config, Harness};
//!
//! let (timing, rest) = args::parse_timing_args(std::env::args().skip(1))?;
//! let mut harness = Harness::init(timing.apply(Config::default().from_env()))?;
//!
//! let mut workload = Bracketed(|n| {
//!     for _ in 0..n {
//!         unsafe { libc::getppid() };
//!     }
//!     Ok(())
//! });
//! let m = harness.measure(&mut workload)?;
//! output::output_latency(m.ticks, m.iterations, m.multiplier, &m.events)?;
//! ```
//!
//! ## Overhead Correction
//!
//! Every bracket subtracts the calibrated overhead and saturates at zero.
//! A workload that finishes faster than an empty bracket therefore reads
//! as exactly zero ticks rather than a negative or noisy value; reported
//! runs that hit this are logged at `warn` level.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod harness;
mod result;
mod types;

// Functional modules
pub mod adaptive;
pub mod args;
pub mod measurement;
pub mod output;
pub mod statistics;

// Re-exports for public API
pub use adaptive::{IterationSizer, SizerState};
pub use config::Config;
pub use error::{HarnessError, Result, SampleSetError, WorkloadError};
pub use harness::Harness;
pub use measurement::{
    Bracketed, Calibration, ClockSpec, EventSelector, Stopwatch, TickSource, Workload,
    WorkloadResult,
};
pub use result::Measurement;
pub use statistics::SampleSet;
pub use types::{ClockMultiplier, EventCounts, Tick};
