//! Unified clock abstraction for the harness.
//!
//! This module provides:
//! - [`TickSource`] - the start/stop capability every clock implements
//! - [`ClockSpec`] - which clock to use, chosen once at startup
//! - [`BoxedClock`] - an enum wrapping all clock implementations
//!
//! | Variant                  | Source                       | Tick        |
//! |--------------------------|------------------------------|-------------|
//! | `WallClock`              | `std::time::Instant`         | microsecond |
//! | `CycleCounter`           | `rdtsc` / `cntvct_el0`       | counter tick|
//! | `CycleCounterWithEvents` | cycle counter + perf_event   | counter tick|
//!
//! Unlike a best-effort timer, creation never falls back: asking for the
//! cycle counter on a machine without one is a configuration error.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::types::{EventCounts, Tick};

use super::perf::{EventCounters, EventSelector};
use super::timer::{CycleCounter, WallClock};

/// A monotonically increasing counter with start/stop semantics.
///
/// Exactly one bracket may be outstanding at a time: `stop` reports the
/// raw elapsed ticks since the most recent `start`. There is deliberately
/// no "read now".
pub trait TickSource {
    /// Record the begin timestamp.
    fn start(&mut self);

    /// Record the end timestamp and return raw elapsed ticks.
    fn stop(&mut self) -> Tick;

    /// Short name for diagnostics and result records.
    fn name(&self) -> &'static str;

    /// Auxiliary event totals for the most recent bracket.
    fn event_counts(&self) -> EventCounts {
        EventCounts::default()
    }
}

impl<T: TickSource + ?Sized> TickSource for Box<T> {
    #[inline]
    fn start(&mut self) {
        (**self).start()
    }

    #[inline]
    fn stop(&mut self) -> Tick {
        (**self).stop()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn event_counts(&self) -> EventCounts {
        (**self).event_counts()
    }
}

/// Cycle counter with up to two auxiliary event counters in lock-step.
#[derive(Debug)]
pub struct EventClock {
    cycles: CycleCounter,
    events: EventCounters,
}

impl EventClock {
    /// Open the cycle counter and the selected event counters.
    pub fn new(selectors: [Option<EventSelector>; 2]) -> Result<Self> {
        let cycles = CycleCounter::new()?;
        let events = EventCounters::new(selectors)?;
        Ok(Self { cycles, events })
    }
}

impl TickSource for EventClock {
    #[inline]
    fn start(&mut self) {
        // Events start after the cycle read so they bracket only the workload.
        self.cycles.start();
        self.events.start();
    }

    #[inline]
    fn stop(&mut self) -> Tick {
        self.events.stop();
        self.cycles.stop()
    }

    fn name(&self) -> &'static str {
        "cycles+events"
    }

    fn event_counts(&self) -> EventCounts {
        self.events.counts()
    }
}

/// Which clock the harness measures with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockSpec {
    /// Monotonic wall clock, microsecond ticks.
    #[default]
    WallClock,

    /// Hardware cycle counter; needs a clock multiplier to report time.
    CycleCounter,

    /// Cycle counter plus up to two auxiliary hardware event counters.
    CycleCounterWithEvents,
}

impl ClockSpec {
    /// Names accepted by [`ClockSpec::by_name`].
    pub const NAMES: &'static [&'static str] = &["wall", "cycles", "cycles+events"];

    /// Select a clock by name (for CLI tools and environment overrides).
    pub fn by_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "wall" | "wallclock" | "usec" => Ok(ClockSpec::WallClock),
            "cycles" | "cycle" | "tsc" => Ok(ClockSpec::CycleCounter),
            "cycles+events" | "events" => Ok(ClockSpec::CycleCounterWithEvents),
            other => Err(HarnessError::ClockUnavailable {
                clock: other.to_string(),
                reason: format!("unknown clock; expected one of: {}", Self::NAMES.join(", ")),
            }),
        }
    }

    /// Create the selected clock.
    ///
    /// `events` is only consulted for `CycleCounterWithEvents`, which
    /// requires at least one selector.
    ///
    /// # Errors
    ///
    /// [`HarnessError::ClockUnavailable`] if the source cannot be used here.
    pub fn create_clock(&self, events: [Option<EventSelector>; 2]) -> Result<BoxedClock> {
        let clock = match self {
            ClockSpec::WallClock => BoxedClock::Wall(WallClock::new()),
            ClockSpec::CycleCounter => BoxedClock::Cycles(CycleCounter::new()?),
            ClockSpec::CycleCounterWithEvents => {
                if events.iter().all(Option::is_none) {
                    return Err(HarnessError::ClockUnavailable {
                        clock: self.to_string(),
                        reason: "no event counter selected (use -c1/-c2)".to_string(),
                    });
                }
                BoxedClock::Events(EventClock::new(events)?)
            }
        };
        tracing::info!(clock = clock.name(), "clock source initialized");
        Ok(clock)
    }
}

impl FromStr for ClockSpec {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        Self::by_name(s)
    }
}

impl std::fmt::Display for ClockSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockSpec::WallClock => write!(f, "wall"),
            ClockSpec::CycleCounter => write!(f, "cycles"),
            ClockSpec::CycleCounterWithEvents => write!(f, "cycles+events"),
        }
    }
}

/// A clock that can be any of the supported implementations.
///
/// Enum dispatch keeps the start/stop hot path free of virtual calls.
#[derive(Debug)]
pub enum BoxedClock {
    /// Wall clock (microseconds).
    Wall(WallClock),
    /// Hardware cycle counter.
    Cycles(CycleCounter),
    /// Cycle counter with auxiliary event counters.
    Events(EventClock),
}

impl TickSource for BoxedClock {
    #[inline]
    fn start(&mut self) {
        match self {
            BoxedClock::Wall(c) => c.start(),
            BoxedClock::Cycles(c) => c.start(),
            BoxedClock::Events(c) => c.start(),
        }
    }

    #[inline]
    fn stop(&mut self) -> Tick {
        match self {
            BoxedClock::Wall(c) => c.stop(),
            BoxedClock::Cycles(c) => c.stop(),
            BoxedClock::Events(c) => c.stop(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            BoxedClock::Wall(c) => c.name(),
            BoxedClock::Cycles(c) => c.name(),
            BoxedClock::Events(c) => c.name(),
        }
    }

    fn event_counts(&self) -> EventCounts {
        match self {
            BoxedClock::Events(c) => c.event_counts(),
            _ => EventCounts::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::timer::cycle_counter_supported;

    #[test]
    fn test_by_name() {
        assert_eq!(ClockSpec::by_name("wall").unwrap(), ClockSpec::WallClock);
        assert_eq!(ClockSpec::by_name("CYCLES").unwrap(), ClockSpec::CycleCounter);
        assert_eq!(
            "cycles+events".parse::<ClockSpec>().unwrap(),
            ClockSpec::CycleCounterWithEvents
        );
        assert!(ClockSpec::by_name("sundial").is_err());
        for name in ClockSpec::NAMES {
            assert_eq!(ClockSpec::by_name(name).unwrap().to_string(), *name);
        }
    }

    #[test]
    fn test_wall_clock_always_available() {
        let clock = ClockSpec::WallClock.create_clock([None, None]).unwrap();
        assert_eq!(clock.name(), "wall");
        assert!(clock.event_counts().is_empty());
    }

    #[test]
    fn test_cycle_counter_never_falls_back() {
        match ClockSpec::CycleCounter.create_clock([None, None]) {
            Ok(clock) => {
                assert!(cycle_counter_supported());
                assert_ne!(clock.name(), "wall");
            }
            Err(HarnessError::ClockUnavailable { .. }) => assert!(!cycle_counter_supported()),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_events_require_a_selector() {
        let err = ClockSpec::CycleCounterWithEvents
            .create_clock([None, None])
            .unwrap_err();
        assert!(matches!(err, HarnessError::ClockUnavailable { .. }));
    }
}
