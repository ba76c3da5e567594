//! Doubling search for a measurable iteration count.

use serde::Serialize;

use crate::measurement::WorkloadResult;
use crate::types::{ClockMultiplier, Tick};

use super::state::SizerState;

/// Default target duration: one real second.
pub const DEFAULT_TARGET_US: f64 = 1_000_000.0;

/// Default iteration cap (2^32).
pub const DEFAULT_MAX_ITERATIONS: u64 = 1 << 32;

/// Searches for the repetition count that makes a workload run for at
/// least the target duration.
///
/// Starting from one iteration the count doubles after every run whose
/// scaled elapsed time is below the target. A failed run backs off to the
/// previous count and ends the search, favouring a usable (possibly short)
/// measurement over aborting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IterationSizer {
    target_us: f64,
    multiplier: ClockMultiplier,
    max_iterations: u64,
}

impl Default for IterationSizer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_US, ClockMultiplier::IDENTITY)
    }
}

impl IterationSizer {
    /// Sizer aiming for `target_us` real microseconds.
    ///
    /// A target that is not a positive finite number is replaced by
    /// [`DEFAULT_TARGET_US`].
    pub fn new(target_us: f64, multiplier: ClockMultiplier) -> Self {
        let target_us = if target_us.is_finite() && target_us > 0.0 {
            target_us
        } else {
            tracing::warn!(target_us, "invalid target duration, using the default");
            DEFAULT_TARGET_US
        };
        Self {
            target_us,
            multiplier,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Stop doubling once the count would exceed `max_iterations`.
    pub fn max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Target duration in real microseconds.
    pub fn target_us(&self) -> f64 {
        self.target_us
    }

    /// True once `elapsed` ticks, scaled to real time, meet the target.
    #[inline]
    pub fn reached(&self, elapsed: Tick) -> bool {
        self.multiplier.to_us(elapsed as f64) >= self.target_us
    }

    /// State after running `iterations` with the given outcome.
    pub fn transition(&self, iterations: u64, outcome: &WorkloadResult) -> SizerState {
        match outcome {
            Err(e) => {
                tracing::debug!(iterations, error = %e, "backing off");
                SizerState::Failed {
                    last_good: (iterations >> 1).max(1),
                }
            }
            Ok(elapsed) => {
                tracing::debug!(
                    iterations,
                    elapsed,
                    us = self.multiplier.to_us(*elapsed as f64),
                    "sizing step"
                );
                if self.reached(*elapsed) {
                    SizerState::Done { iterations }
                } else {
                    SizerState::Growing {
                        iterations,
                        elapsed: *elapsed,
                    }
                }
            }
        }
    }

    /// Run the search and return the chosen iteration count.
    ///
    /// `run(k)` must perform `k` repetitions and report corrected elapsed
    /// ticks. The result is at least 1. If the very first run fails, 1 is
    /// returned.
    pub fn size<F>(&self, mut run: F) -> u64
    where
        F: FnMut(u64) -> WorkloadResult,
    {
        let mut state = self.transition(1, &run(1));

        while let SizerState::Growing { iterations, .. } = state {
            state = match iterations.checked_mul(2).filter(|&k| k <= self.max_iterations) {
                Some(next) => self.transition(next, &run(next)),
                None => {
                    tracing::warn!(
                        iterations,
                        target_us = self.target_us,
                        "iteration cap reached before target duration"
                    );
                    SizerState::Done { iterations }
                }
            };
        }

        let chosen = state.iterations();
        tracing::debug!(iterations = chosen, "choosing iteration count");
        chosen
    }
}
