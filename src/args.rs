//! Command-line prefix shared by every benchmark program.
//!
//! Benchmarks are invoked as
//!
//! ```text
//! prog [-c1 csel1] [-c2 csel2] clock_multiplier <benchmark args...>
//! ```
//!
//! [`parse_timing_args`] consumes the timing prefix and hands back the
//! rest. `-c1` must come before `-c2` when both are given.

use crate::config::Config;
use crate::error::{HarnessError, Result};
use crate::measurement::{ClockSpec, EventSelector};
use crate::types::ClockMultiplier;

/// Usage fragment to append after the program name.
pub const USAGE: &str = " [-c1 csel1] [-c2 csel2] clock_multiplier";

/// Timing options taken from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingArgs {
    /// Microseconds per native tick.
    pub multiplier: ClockMultiplier,
    /// Selected auxiliary event counters.
    pub events: [Option<EventSelector>; 2],
}

impl TimingArgs {
    /// True if any auxiliary counter was selected.
    pub fn has_events(&self) -> bool {
        self.events.iter().any(Option::is_some)
    }

    /// Fold these options into `config`.
    ///
    /// Selecting a counter switches the clock to
    /// [`ClockSpec::CycleCounterWithEvents`].
    pub fn apply(&self, mut config: Config) -> Config {
        config.multiplier = self.multiplier;
        config.events = self.events;
        if self.has_events() {
            config.clock = ClockSpec::CycleCounterWithEvents;
        }
        config
    }
}

/// Parse the timing prefix from `args` (program name excluded).
///
/// Returns the options and the remaining benchmark arguments.
///
/// # Errors
///
/// [`HarnessError::InvalidArguments`] when the multiplier is missing, is
/// not a positive number, or a `-cN` flag has no selector;
/// [`HarnessError::InvalidEventSelector`] for an unknown selector.
pub fn parse_timing_args<I, S>(args: I) -> Result<(TimingArgs, Vec<String>)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into).peekable();
    let mut events = [None, None];

    for (slot, flag) in ["-c1", "-c2"].into_iter().enumerate() {
        if args.peek().map(String::as_str) == Some(flag) {
            args.next();
            let selector = args.next().ok_or_else(|| {
                HarnessError::InvalidArguments(format!("{} needs an event selector", flag))
            })?;
            events[slot] = Some(selector.parse()?);
        }
    }

    let raw = args
        .next()
        .ok_or_else(|| HarnessError::InvalidArguments("missing clock multiplier".to_string()))?;
    let multiplier = raw
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(ClockMultiplier::new)
        .ok_or_else(|| {
            HarnessError::InvalidArguments(format!("bad clock multiplier '{}'", raw))
        })?;

    Ok((TimingArgs { multiplier, events }, args.collect()))
}

/// Parse a byte count with an optional `k`/`K` (x1024) or `m`/`M`
/// (x1024^2) suffix.
///
/// # Errors
///
/// [`HarnessError::InvalidArguments`] if the number does not parse or the
/// size overflows.
pub fn parse_bytes(s: &str) -> Result<u64> {
    let s = s.trim();
    let (digits, scale) = match s.chars().last() {
        Some('k' | 'K') => (&s[..s.len() - 1], 1024),
        Some('m' | 'M') => (&s[..s.len() - 1], 1024 * 1024),
        _ => (s, 1),
    };

    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(scale))
        .ok_or_else(|| HarnessError::InvalidArguments(format!("bad size '{}'", s)))
}
