//! Bracket overhead calibration.
//!
//! The cost of an empty start/stop pair is measured once per process and
//! subtracted from every later bracket:
//!
//! 1. One warm-up bracket is discarded (caches, lazy symbol binding).
//! 2. `outer` trials each average `inner` back-to-back empty brackets.
//! 3. The trial means go through a trimmed mean (20% tails by default,
//!    i.e. the 2 lowest and 2 highest of 10) to reject scheduling noise.

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::statistics::SampleSet;
use crate::types::Tick;

use super::cycle_timer::TickSource;

/// Parameters of the overhead estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Number of trials whose means are aggregated (default: 10).
    pub outer: usize,
    /// Empty brackets averaged per trial (default: 100).
    pub inner: usize,
    /// Fraction trimmed from each end of the trial means (default: 0.2).
    pub tail_fraction: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            outer: 10,
            inner: 100,
            tail_fraction: 0.2,
        }
    }
}

/// The process-wide bracket overhead, fixed once computed.
///
/// Only [`calibrate_overhead`] and [`Calibration::from_overhead`] create
/// one, and there is no way to change it afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    overhead: Tick,
}

impl Calibration {
    /// Use a known overhead instead of measuring it.
    ///
    /// `from_overhead(0)` disables correction entirely.
    pub fn from_overhead(overhead: Tick) -> Self {
        Self { overhead }
    }

    /// Fixed cost of one start/stop bracket, in native ticks.
    #[inline]
    pub fn overhead(&self) -> Tick {
        self.overhead
    }
}

/// Measure the fixed cost of a start/stop bracket on `clock`.
///
/// Raw (uncorrected) readings are used throughout. Per-trial means use
/// integer division, so a deterministic clock gives the same constant on
/// every call.
///
/// # Errors
///
/// [`HarnessError::InvalidArguments`] if `inner` is zero, and
/// [`HarnessError::SampleSet`] if `outer` and `tail_fraction` leave no
/// trial to average.
pub fn calibrate_overhead<C: TickSource>(
    clock: &mut C,
    config: &CalibrationConfig,
) -> Result<Calibration> {
    if config.inner == 0 {
        return Err(HarnessError::InvalidArguments(
            "overhead calibration needs at least one bracket per trial".to_string(),
        ));
    }

    let mut trials = SampleSet::with_capacity(config.outer, config.tail_fraction)?;

    clock.start();
    let _ = clock.stop();

    for _ in 0..config.outer {
        let mut total: u128 = 0;
        for _ in 0..config.inner {
            clock.start();
            total += u128::from(clock.stop());
        }
        let mean = total / config.inner as u128;
        trials.add(u64::try_from(mean).unwrap_or(u64::MAX))?;
    }

    let overhead = trials.finish()?.floor() as Tick;
    tracing::debug!(overhead, clock = clock.name(), "timing overhead calibrated");

    Ok(Calibration { overhead })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SampleSetError;

    /// Replays a scripted sequence of raw elapsed values, cycling.
    struct ScriptedClock {
        script: Vec<Tick>,
        pos: usize,
        brackets: usize,
    }

    impl ScriptedClock {
        fn new(script: Vec<Tick>) -> Self {
            Self {
                script,
                pos: 0,
                brackets: 0,
            }
        }
    }

    impl TickSource for ScriptedClock {
        fn start(&mut self) {}
        fn stop(&mut self) -> Tick {
            let v = self.script[self.pos % self.script.len()];
            self.pos += 1;
            self.brackets += 1;
            v
        }
        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    #[test]
    fn test_constant_clock_yields_constant() {
        let mut clock = ScriptedClock::new(vec![42]);
        let cal = calibrate_overhead(&mut clock, &CalibrationConfig::default()).unwrap();
        assert_eq!(cal.overhead(), 42);
        // warm-up + 10 * 100
        assert_eq!(clock.brackets, 1 + 10 * 100);
    }

    #[test]
    fn test_spikes_in_outer_trials_are_trimmed() {
        // Warm-up reads 1_000_000; then ten trials of one bracket each.
        let config = CalibrationConfig {
            outer: 10,
            inner: 1,
            tail_fraction: 0.2,
        };
        let mut clock =
            ScriptedClock::new(vec![1_000_000, 10, 10, 10, 10, 10, 10, 0, 0, 9_000, 9_000]);
        let cal = calibrate_overhead(&mut clock, &config).unwrap();
        assert_eq!(cal.overhead(), 10);
    }

    #[test]
    fn test_zero_inner_rejected() {
        let config = CalibrationConfig {
            inner: 0,
            ..CalibrationConfig::default()
        };
        let mut clock = ScriptedClock::new(vec![1]);
        assert!(matches!(
            calibrate_overhead(&mut clock, &config),
            Err(HarnessError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_zero_outer_rejected() {
        let config = CalibrationConfig {
            outer: 0,
            ..CalibrationConfig::default()
        };
        let mut clock = ScriptedClock::new(vec![1]);
        assert!(matches!(
            calibrate_overhead(&mut clock, &config),
            Err(HarnessError::SampleSet(SampleSetError::NoCapacity))
        ));
    }
}
