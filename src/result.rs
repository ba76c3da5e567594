//! Result of one reported measurement.

use serde::{Deserialize, Serialize};

use crate::output::report;
use crate::types::{ClockMultiplier, EventCounts, Tick};

/// One reported run: corrected ticks for `iterations` repetitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Overhead-corrected elapsed ticks for the whole run.
    pub ticks: Tick,

    /// Repetitions performed.
    pub iterations: u64,

    /// Scale from ticks to microseconds used for reporting.
    pub multiplier: ClockMultiplier,

    /// Name of the clock that produced `ticks`.
    pub clock: String,

    /// Auxiliary event totals over the run (raw, not per-iteration).
    #[serde(default, skip_serializing_if = "EventCounts::is_empty")]
    pub events: EventCounts,
}

impl Measurement {
    /// Total elapsed time in microseconds.
    pub fn elapsed_us(&self) -> f64 {
        self.multiplier.to_us(self.ticks as f64)
    }

    /// Microseconds per iteration.
    pub fn latency_us(&self) -> f64 {
        report::latency_us(self.ticks, self.iterations, self.multiplier)
    }

    /// Nanoseconds per iteration.
    pub fn latency_ns(&self) -> f64 {
        report::latency_ns(self.ticks, self.iterations, self.multiplier)
    }

    /// MB/s for a run that moved `bytes` in total (MB = 2^20 bytes).
    pub fn bandwidth_mb_per_s(&self, bytes: u64) -> f64 {
        report::bandwidth_mb_per_s(bytes, self.ticks, self.multiplier)
    }

    /// True when the correction clamped the run to zero ticks.
    pub fn is_clamped(&self) -> bool {
        self.ticks == 0
    }
}
