//! Main `Harness` entry point.

use crate::adaptive::IterationSizer;
use crate::config::Config;
use crate::error::{Result, WorkloadError};
use crate::measurement::{
    calibrate_overhead, BoxedClock, Calibration, Stopwatch, TickSource, Workload, WorkloadResult,
};
use crate::result::Measurement;
use crate::types::{ClockMultiplier, EventCounts};

/// Startup state of a benchmark process: the chosen clock, its calibrated
/// bracket overhead, and the configuration.
///
/// A `Harness` only exists once calibration has succeeded, so every
/// measurement taken through it is overhead-corrected. Create one per
/// process and pass it by reference to whatever needs to time things.
///
/// # Example
///
/// ```ignore
/// use hbench_timing::{Bracketed, Config, Harness, output};
///
/// let mut harness = Harness::init(Config::default().from_env())?;
/// let mut workload = Bracketed(|n| {
///     for _ in 0..n {
///         unsafe { libc::getppid() };
///     }
///     Ok(())
/// });
/// let m = harness.measure(&mut workload)?;
/// output::output_latency(m.ticks, m.iterations, m.multiplier, &m.events)?;
/// ```
#[derive(Debug)]
pub struct Harness<C = BoxedClock> {
    stopwatch: Stopwatch<C>,
    config: Config,
}

impl Harness<BoxedClock> {
    /// Wall-clock harness with default configuration.
    pub fn new() -> Result<Self> {
        Self::init(Config::default())
    }

    /// Create the configured clock and calibrate it.
    ///
    /// # Errors
    ///
    /// [`HarnessError::ClockUnavailable`](crate::HarnessError::ClockUnavailable)
    /// if the clock (or an event counter) cannot be used on this machine,
    /// and calibration errors for a degenerate calibration setup.
    pub fn init(config: Config) -> Result<Self> {
        let clock = config.clock.create_clock(config.events)?;
        Self::with_clock(clock, config)
    }
}

impl<C: TickSource> Harness<C> {
    /// Calibrate `clock` and wrap it.
    pub fn with_clock(mut clock: C, config: Config) -> Result<Self> {
        let calibration = calibrate_overhead(&mut clock, &config.calibration_config())?;
        Ok(Self::with_calibration(clock, calibration, config))
    }

    /// Wrap `clock` with a known calibration, skipping the measurement.
    pub fn with_calibration(clock: C, calibration: Calibration, config: Config) -> Self {
        Self {
            stopwatch: Stopwatch::new(clock, calibration),
            config,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The fixed bracket overhead subtracted from every measurement.
    pub fn calibration(&self) -> Calibration {
        self.stopwatch.calibration()
    }

    /// Set the microseconds-per-tick factor used for sizing and reporting.
    pub fn multiplier(mut self, multiplier: ClockMultiplier) -> Self {
        self.config.multiplier = multiplier;
        self
    }

    /// Set the real duration, in microseconds, the sized workload should run.
    ///
    /// Values that are not positive and finite are ignored.
    pub fn target_us(mut self, target_us: f64) -> Self {
        if target_us.is_finite() && target_us > 0.0 {
            self.config.target_us = target_us;
        } else {
            tracing::warn!(target_us, "ignoring invalid target duration");
        }
        self
    }

    /// Measure exactly one iteration, without sizing or priming.
    pub fn cold_cache(mut self, cold_cache: bool) -> Self {
        self.config.cold_cache = cold_cache;
        self
    }

    /// Cap the sized iteration count.
    pub fn max_iterations(mut self, max_iterations: u64) -> Self {
        self.config.max_iterations = max_iterations.max(1);
        self
    }

    /// The corrected stopwatch, for workloads that time themselves.
    pub fn stopwatch(&mut self) -> &mut Stopwatch<C> {
        &mut self.stopwatch
    }

    /// Time `body` for `iterations` repetitions.
    pub fn bracket<F>(&mut self, iterations: u64, body: F) -> WorkloadResult
    where
        F: FnOnce(u64) -> std::result::Result<(), WorkloadError>,
    {
        self.stopwatch.bracket(iterations, body)
    }

    /// Iteration sizer for this configuration.
    pub fn sizer(&self) -> IterationSizer {
        IterationSizer::new(self.config.target_us, self.config.multiplier)
            .max_iterations(self.config.max_iterations)
    }

    /// Find the iteration count that makes `workload` run for the target
    /// duration. Workload failures only shrink the count.
    pub fn iterations<W: Workload<C>>(&mut self, workload: &mut W) -> u64 {
        let sizer = self.sizer();
        let stopwatch = &mut self.stopwatch;
        sizer.size(|k| workload.run(stopwatch, k))
    }

    /// Size, prime and measure `workload`.
    pub fn measure<W: Workload<C>>(&mut self, workload: &mut W) -> Result<Measurement> {
        self.measure_with(workload, 0)
    }

    /// Measure `workload` for `iterations` repetitions, sizing first when
    /// `iterations` is zero.
    ///
    /// A one-iteration priming run precedes the reported run to warm caches
    /// and its result is discarded. In cold-cache mode exactly one
    /// iteration is measured, without sizing or priming.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Workload`](crate::HarnessError::Workload) if the
    /// priming or reported run fails.
    pub fn measure_with<W: Workload<C>>(
        &mut self,
        workload: &mut W,
        iterations: u64,
    ) -> Result<Measurement> {
        let iterations = if self.config.cold_cache {
            1
        } else {
            let n = if iterations == 0 {
                self.iterations(workload)
            } else {
                iterations
            };
            workload.run(&mut self.stopwatch, 1)?;
            n
        };

        let ticks = workload.run(&mut self.stopwatch, iterations)?;
        if ticks == 0 {
            tracing::warn!(
                iterations,
                overhead = self.calibration().overhead(),
                "run did not exceed the bracket overhead; reporting zero ticks"
            );
        }

        Ok(Measurement {
            ticks,
            iterations,
            multiplier: self.config.multiplier,
            clock: self.stopwatch.clock_name().to_string(),
            events: self.event_counts(),
        })
    }

    /// Auxiliary counter totals for the most recent bracket.
    pub fn event_counts(&self) -> EventCounts {
        self.stopwatch.event_counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::Bracketed;
    use crate::types::Tick;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Reports `per_iteration * n` raw ticks for a bracket around `n` iterations.
    struct LinearClock {
        per_iteration: Tick,
        overhead: Tick,
        current: Rc<Cell<u64>>,
    }

    impl TickSource for LinearClock {
        fn start(&mut self) {}
        fn stop(&mut self) -> Tick {
            self.overhead + self.per_iteration * self.current.get()
        }
        fn name(&self) -> &'static str {
            "linear"
        }
    }

    fn harness(config: Config) -> (Harness<LinearClock>, Rc<Cell<u64>>) {
        let current = Rc::new(Cell::new(0));
        let clock = LinearClock {
            per_iteration: 1000,
            overhead: 7,
            current: Rc::clone(&current),
        };
        (Harness::with_clock(clock, config).unwrap(), current)
    }

    #[test]
    fn test_calibration_measures_empty_bracket() {
        let (h, _) = harness(Config::default());
        assert_eq!(h.calibration().overhead(), 7);
    }

    #[test]
    fn test_measure_sizes_primes_and_reports() {
        let (mut h, current) = harness(Config::default());
        let mut runs = Vec::new();
        let mut workload = Bracketed(|n: u64| -> std::result::Result<(), WorkloadError> {
            current.set(n);
            runs.push(n);
            Ok(())
        });
        let m = h.measure(&mut workload).unwrap();
        drop(workload);

        assert_eq!(m.iterations, 1024);
        assert_eq!(m.ticks, 1024 * 1000);
        assert_eq!(m.clock, "linear");
        // sizing 1..=1024, then prime with 1, then the reported run
        assert_eq!(&runs[runs.len() - 2..], &[1, 1024]);
        assert_eq!(runs.len(), 11 + 2);
    }

    #[test]
    fn test_explicit_count_skips_sizing() {
        let (mut h, current) = harness(Config::default());
        let mut runs = Vec::new();
        let mut workload = Bracketed(|n: u64| -> std::result::Result<(), WorkloadError> {
            current.set(n);
            runs.push(n);
            Ok(())
        });
        let m = h.measure_with(&mut workload, 50).unwrap();
        drop(workload);
        assert_eq!(runs, vec![1, 50]);
        assert_eq!(m.latency_us(), 1000.0);
    }

    #[test]
    fn test_cold_cache_runs_once() {
        let config = Config {
            cold_cache: true,
            ..Config::default()
        };
        let (mut h, current) = harness(config);
        let mut runs = Vec::new();
        let mut workload = Bracketed(|n: u64| -> std::result::Result<(), WorkloadError> {
            current.set(n);
            runs.push(n);
            Ok(())
        });
        let m = h.measure(&mut workload).unwrap();
        drop(workload);
        assert_eq!(runs, vec![1]);
        assert_eq!(m.iterations, 1);
        assert_eq!(m.ticks, 1000);
    }

    #[test]
    fn test_builder_setters() {
        let (h, _) = harness(Config::default());
        let h = h
            .multiplier(ClockMultiplier::new(0.5).unwrap())
            .target_us(250.0)
            .cold_cache(true)
            .max_iterations(0);
        assert_eq!(h.config().multiplier.us_per_tick(), 0.5);
        assert_eq!(h.config().target_us, 250.0);
        assert!(h.config().cold_cache);
        assert_eq!(h.config().max_iterations, 1);
        assert_eq!(h.calibration().overhead(), 7);

        let h = h.target_us(f64::NAN).target_us(-1.0);
        assert_eq!(h.config().target_us, 250.0);
    }

    #[test]
    fn test_setters_drive_sizing() {
        let (h, current) = harness(Config::default());
        // 1000 ticks per iteration at 0.5 us per tick: 4000 us needs k = 8
        let mut h = h
            .multiplier(ClockMultiplier::new(0.5).unwrap())
            .target_us(4_000.0);
        let mut workload = Bracketed(|n: u64| -> std::result::Result<(), WorkloadError> {
            current.set(n);
            Ok(())
        });
        assert_eq!(h.iterations(&mut workload), 8);

        let mut h = h.max_iterations(4);
        assert_eq!(h.iterations(&mut workload), 4);

        let mut h = h.cold_cache(true);
        let m = h.measure(&mut workload).unwrap();
        assert_eq!(m.iterations, 1);
        assert_eq!(m.latency_us(), 500.0);
    }

    #[test]
    fn test_failed_reported_run_propagates() {
        let (mut h, _) = harness(Config::default());
        let mut workload = Bracketed(|_n: u64| -> std::result::Result<(), WorkloadError> {
            Err(WorkloadError::Failed("boom".into()))
        });
        let err = h.measure_with(&mut workload, 8).unwrap_err();
        assert!(matches!(err, crate::HarnessError::Workload(_)));
    }
}
