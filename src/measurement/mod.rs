//! Measurement infrastructure: clocks, overhead calibration and brackets.
//!
//! This module provides:
//! - Platform time sources (wall clock, hardware cycle counter)
//! - Auxiliary perf_event counters run in lock-step with the cycle counter
//! - One-time calibration of the start/stop bracket overhead
//! - The overhead-corrected [`Stopwatch`] and the [`Workload`] contract
//!
//! # Clock Selection
//!
//! The clock is chosen once, at startup, through [`ClockSpec`]:
//! - **WallClock**: microsecond ticks, available everywhere
//! - **CycleCounter**: `rdtsc` on x86_64, `cntvct_el0` on aarch64
//! - **CycleCounterWithEvents**: cycle counter plus up to two hardware
//!   event counters (Linux, `perf` feature)
//!
//! Cycle-based clocks report native ticks; supply a clock multiplier
//! (microseconds per tick) to get real time. [`estimate_clock_multiplier`]
//! can suggest one when the counter rate is not known.

mod calibration;
mod cycle_timer;
pub mod perf;
mod stopwatch;
mod timer;

pub use calibration::{calibrate_overhead, Calibration, CalibrationConfig};
pub use cycle_timer::{BoxedClock, ClockSpec, EventClock, TickSource};
pub use perf::{EventCounters, EventSelector};
pub use stopwatch::{Bracketed, Stopwatch, Workload, WorkloadResult};
pub use timer::{
    black_box, cycle_counter_supported, estimate_clock_multiplier, read_cycle_counter,
    CycleCounter, WallClock,
};
