//! Overhead-corrected start/stop brackets and the workload contract.

use crate::error::WorkloadError;
use crate::types::{EventCounts, Tick};

use super::calibration::Calibration;
use super::cycle_timer::{BoxedClock, TickSource};

/// Outcome of one workload invocation: elapsed ticks, or why it stopped.
pub type WorkloadResult = Result<Tick, WorkloadError>;

/// A clock paired with its calibrated bracket overhead.
///
/// `stop` returns `max(0, raw - overhead)`. Anything at or below the
/// overhead reads as exactly zero, which hides sub-resolution timings
/// rather than reporting them as negative.
#[derive(Debug)]
pub struct Stopwatch<C = BoxedClock> {
    clock: C,
    calibration: Calibration,
}

impl<C: TickSource> Stopwatch<C> {
    /// Pair a clock with a calibration.
    pub fn new(clock: C, calibration: Calibration) -> Self {
        Self { clock, calibration }
    }

    /// Begin a bracket.
    #[inline]
    pub fn start(&mut self) {
        self.clock.start();
    }

    /// End the bracket and return corrected elapsed ticks.
    #[inline]
    pub fn stop(&mut self) -> Tick {
        self.clock.stop().saturating_sub(self.calibration.overhead())
    }

    /// Time `body` configured for `iterations` repetitions.
    ///
    /// The body may fork, block or allocate; elapsed time spans whatever it
    /// does. A failing body still closes the bracket so the clock is never
    /// left with an outstanding `start`.
    #[inline]
    pub fn bracket<F>(&mut self, iterations: u64, body: F) -> WorkloadResult
    where
        F: FnOnce(u64) -> Result<(), WorkloadError>,
    {
        self.start();
        let status = body(iterations);
        let elapsed = self.stop();
        status.map(|()| elapsed)
    }

    /// Calibration applied to every bracket.
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Auxiliary event totals for the most recent bracket.
    pub fn event_counts(&self) -> EventCounts {
        self.clock.event_counts()
    }

    /// Name of the underlying clock.
    pub fn clock_name(&self) -> &'static str {
        self.clock.name()
    }

    /// The underlying clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// A unit of work under measurement.
///
/// `run` performs `iterations` repetitions, timing itself with the
/// stopwatch it is handed, and returns the elapsed ticks. It must release
/// anything it allocates before returning: the iteration sizer calls it
/// many times.
///
/// Closures `FnMut(&mut Stopwatch<C>, u64) -> WorkloadResult` implement
/// this directly; [`Bracketed`] adapts a body that does not time itself.
pub trait Workload<C: TickSource = BoxedClock> {
    /// Run `iterations` repetitions and report elapsed ticks.
    fn run(&mut self, stopwatch: &mut Stopwatch<C>, iterations: u64) -> WorkloadResult;
}

impl<C, F> Workload<C> for F
where
    C: TickSource,
    F: FnMut(&mut Stopwatch<C>, u64) -> WorkloadResult,
{
    #[inline]
    fn run(&mut self, stopwatch: &mut Stopwatch<C>, iterations: u64) -> WorkloadResult {
        self(stopwatch, iterations)
    }
}

/// Workload whose body is bracketed by the harness.
///
/// Use this when setup inside the body is cheap enough to be timed along
/// with the work; otherwise implement [`Workload`] and call `start`/`stop`
/// around just the part of interest.
#[derive(Debug, Clone)]
pub struct Bracketed<F>(pub F);

impl<C, F> Workload<C> for Bracketed<F>
where
    C: TickSource,
    F: FnMut(u64) -> Result<(), WorkloadError>,
{
    #[inline]
    fn run(&mut self, stopwatch: &mut Stopwatch<C>, iterations: u64) -> WorkloadResult {
        stopwatch.bracket(iterations, &mut self.0)
    }
}
