//! Scalar types shared by the clock, the calibrator and the formatter.

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Elapsed time in the active clock's native unit.
///
/// Microseconds for the wall clock, cycles for the cycle counter. Corrected
/// ticks are never negative: subtraction of the bracket overhead saturates
/// at zero.
pub type Tick = u64;

/// Operator-supplied scale factor from native ticks to real microseconds.
///
/// Only applied at the reporting boundary (and when the iteration sizer
/// compares elapsed time against its target). Defaults to 1.0, which is
/// exact for the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ClockMultiplier(f64);

impl ClockMultiplier {
    /// Identity multiplier (ticks are already microseconds).
    pub const IDENTITY: ClockMultiplier = ClockMultiplier(1.0);

    /// Create a multiplier, rejecting non-finite or non-positive values.
    pub fn new(us_per_tick: f64) -> Option<Self> {
        if us_per_tick.is_finite() && us_per_tick > 0.0 {
            Some(Self(us_per_tick))
        } else {
            None
        }
    }

    /// Microseconds per native tick.
    #[inline]
    pub fn us_per_tick(self) -> f64 {
        self.0
    }

    /// Convert native ticks to microseconds.
    #[inline]
    pub fn to_us(self, ticks: f64) -> f64 {
        ticks * self.0
    }
}

impl Default for ClockMultiplier {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<f64> for ClockMultiplier {
    type Error = HarnessError;

    fn try_from(us_per_tick: f64) -> Result<Self, Self::Error> {
        Self::new(us_per_tick).ok_or_else(|| {
            HarnessError::InvalidArguments(format!(
                "clock multiplier must be a positive finite number, got {}",
                us_per_tick
            ))
        })
    }
}

impl From<ClockMultiplier> for f64 {
    fn from(multiplier: ClockMultiplier) -> f64 {
        multiplier.0
    }
}

impl std::fmt::Display for ClockMultiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Totals read from the two auxiliary hardware event counters.
///
/// A slot is `None` when that counter was not selected. Values cover the
/// most recent start/stop bracket only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    /// First auxiliary counter (`-c1`).
    pub c1: Option<u64>,
    /// Second auxiliary counter (`-c2`).
    pub c2: Option<u64>,
}

impl EventCounts {
    /// True when neither counter is active.
    pub fn is_empty(&self) -> bool {
        self.c1.is_none() && self.c2.is_none()
    }

    /// Active counter values, in selector order.
    pub fn active(&self) -> impl Iterator<Item = u64> {
        self.c1.into_iter().chain(self.c2)
    }

    /// Scale each active counter down to a per-iteration count.
    pub fn per_iteration(&self, iterations: u64) -> EventCounts {
        let n = iterations.max(1);
        EventCounts {
            c1: self.c1.map(|v| v / n),
            c2: self.c2.map(|v| v / n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_rejects_nonsense() {
        assert!(ClockMultiplier::new(0.0).is_none());
        assert!(ClockMultiplier::new(-1.0).is_none());
        assert!(ClockMultiplier::new(f64::NAN).is_none());
        assert_eq!(ClockMultiplier::new(0.005).unwrap().us_per_tick(), 0.005);
        assert_eq!(ClockMultiplier::default(), ClockMultiplier::IDENTITY);
    }

    #[test]
    fn multiplier_deserialization_is_checked() {
        for bad in ["0.0", "-1.0", "-2.0"] {
            assert!(
                serde_json::from_str::<ClockMultiplier>(bad).is_err(),
                "{} was accepted",
                bad
            );
        }
        let m: ClockMultiplier = serde_json::from_str("0.25").unwrap();
        assert_eq!(m.us_per_tick(), 0.25);
        assert_eq!(serde_json::to_string(&m).unwrap(), "0.25");
        assert!(ClockMultiplier::try_from(f64::NAN).is_err());
    }

    #[test]
    fn event_counts_per_iteration() {
        let counts = EventCounts { c1: Some(1000), c2: None };
        let per = counts.per_iteration(10);
        assert_eq!(per.c1, Some(100));
        assert_eq!(per.c2, None);
        assert_eq!(per.active().collect::<Vec<_>>(), vec![100]);
        assert!(EventCounts::default().is_empty());
    }
}
