//! Auxiliary hardware event counters for Linux using perf_event.
//!
//! Up to two counters run in lock-step with the primary cycle counter:
//! they are enabled after the cycle counter is read at `start` and
//! disabled before it is read at `stop`, so the bracket around the events
//! is as tight as possible.
//!
//! # Requirements
//!
//! - Linux kernel with perf_event support
//! - Root, `CAP_PERFMON`, or `kernel.perf_event_paranoid <= 2`
//! - Enable with `--features perf`
//!
//! Selectors are parsed on every platform so that argument handling is
//! uniform; programming them fails with
//! [`HarnessError::ClockUnavailable`] when the support is not built in.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::types::EventCounts;

/// Hardware event an auxiliary counter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSelector {
    /// Core cycles.
    Cycles,
    /// Retired instructions.
    Instructions,
    /// Last-level cache references.
    CacheReferences,
    /// Last-level cache misses.
    CacheMisses,
    /// Retired branch instructions.
    Branches,
    /// Mispredicted branches.
    BranchMisses,
    /// Bus cycles.
    BusCycles,
    /// Reference cycles (unaffected by frequency scaling).
    RefCycles,
    /// Model-specific raw event code.
    Raw(u64),
}

impl EventSelector {
    /// Symbolic names accepted by [`FromStr`].
    pub const NAMES: &'static [&'static str] = &[
        "cycles",
        "instructions",
        "cache-references",
        "cache-misses",
        "branches",
        "branch-misses",
        "bus-cycles",
        "ref-cycles",
    ];
}

impl FromStr for EventSelector {
    type Err = HarnessError;

    /// Parse a symbolic event name, or a raw code in decimal or `0x` hex.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let selector = match lower.as_str() {
            "cycles" | "cpu-cycles" => EventSelector::Cycles,
            "instructions" => EventSelector::Instructions,
            "cache-references" => EventSelector::CacheReferences,
            "cache-misses" => EventSelector::CacheMisses,
            "branches" | "branch-instructions" => EventSelector::Branches,
            "branch-misses" => EventSelector::BranchMisses,
            "bus-cycles" => EventSelector::BusCycles,
            "ref-cycles" => EventSelector::RefCycles,
            other => {
                let code = match other.strip_prefix("0x") {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => other.parse::<u64>(),
                };
                EventSelector::Raw(
                    code.map_err(|_| HarnessError::InvalidEventSelector(s.to_string()))?,
                )
            }
        };
        Ok(selector)
    }
}

impl std::fmt::Display for EventSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventSelector::Cycles => write!(f, "cycles"),
            EventSelector::Instructions => write!(f, "instructions"),
            EventSelector::CacheReferences => write!(f, "cache-references"),
            EventSelector::CacheMisses => write!(f, "cache-misses"),
            EventSelector::Branches => write!(f, "branches"),
            EventSelector::BranchMisses => write!(f, "branch-misses"),
            EventSelector::BusCycles => write!(f, "bus-cycles"),
            EventSelector::RefCycles => write!(f, "ref-cycles"),
            EventSelector::Raw(code) => write!(f, "{:#x}", code),
        }
    }
}

/// Two auxiliary perf_event counters driven together.
#[cfg(all(target_os = "linux", feature = "perf"))]
pub struct EventCounters {
    counters: [Option<::perf_event2::Counter>; 2],
    selectors: [Option<EventSelector>; 2],
    started: [bool; 2],
    last: EventCounts,
}

#[cfg(all(target_os = "linux", feature = "perf"))]
impl EventCounters {
    /// Open a counter for each selected slot.
    ///
    /// # Errors
    ///
    /// [`HarnessError::ClockUnavailable`] if the kernel refuses to open a
    /// counter (missing PMU, insufficient privilege).
    pub fn new(selectors: [Option<EventSelector>; 2]) -> Result<Self> {
        let mut counters: [Option<::perf_event2::Counter>; 2] = [None, None];
        for (slot, selector) in selectors.iter().enumerate() {
            if let Some(selector) = selector {
                counters[slot] = Some(open_counter(*selector)?);
            }
        }
        tracing::info!(
            c1 = ?selectors[0].map(|s| s.to_string()),
            c2 = ?selectors[1].map(|s| s.to_string()),
            "perf_event counters opened"
        );
        Ok(Self {
            counters,
            selectors,
            started: [false; 2],
            last: EventCounts::default(),
        })
    }

    /// Selectors programmed into each slot.
    pub fn selectors(&self) -> [Option<EventSelector>; 2] {
        self.selectors
    }

    /// Zero and enable every active counter.
    ///
    /// A counter that fails to start reports no value for this bracket.
    #[inline]
    pub fn start(&mut self) {
        for (counter, started) in self.counters.iter_mut().zip(self.started.iter_mut()) {
            *started = match counter {
                Some(counter) => match counter.reset().and_then(|_| counter.enable()) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!("failed to start event counter: {}", e);
                        false
                    }
                },
                None => false,
            };
        }
    }

    /// Disable every active counter and latch its total.
    #[inline]
    pub fn stop(&mut self) {
        for counter in self.counters.iter_mut().flatten() {
            if let Err(e) = counter.disable() {
                tracing::warn!("failed to stop event counter: {}", e);
            }
        }
        let [c1, c2] = &mut self.counters;
        let [s1, s2] = self.started;
        self.last = EventCounts {
            c1: c1.as_mut().and_then(|c| latched_total(s1, || c.read())),
            c2: c2.as_mut().and_then(|c| latched_total(s2, || c.read())),
        };
        self.started = [false; 2];
    }

    /// Totals from the most recent start/stop pair.
    pub fn counts(&self) -> EventCounts {
        self.last
    }
}

/// Value of a counter at the end of a bracket, or `None` if it did not
/// start cleanly or cannot be read.
#[cfg_attr(not(all(target_os = "linux", feature = "perf")), allow(dead_code))]
fn latched_total<F>(started: bool, read: F) -> Option<u64>
where
    F: FnOnce() -> std::io::Result<u64>,
{
    if !started {
        return None;
    }
    match read() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("failed to read event counter: {}", e);
            None
        }
    }
}

#[cfg(all(target_os = "linux", feature = "perf"))]
fn open_counter(selector: EventSelector) -> Result<::perf_event2::Counter> {
    use ::perf_event2::events::{Hardware, Raw};
    use ::perf_event2::Builder;

    let builder = match selector {
        EventSelector::Cycles => Builder::new(Hardware::CPU_CYCLES),
        EventSelector::Instructions => Builder::new(Hardware::INSTRUCTIONS),
        EventSelector::CacheReferences => Builder::new(Hardware::CACHE_REFERENCES),
        EventSelector::CacheMisses => Builder::new(Hardware::CACHE_MISSES),
        EventSelector::Branches => Builder::new(Hardware::BRANCH_INSTRUCTIONS),
        EventSelector::BranchMisses => Builder::new(Hardware::BRANCH_MISSES),
        EventSelector::BusCycles => Builder::new(Hardware::BUS_CYCLES),
        EventSelector::RefCycles => Builder::new(Hardware::REF_CPU_CYCLES),
        EventSelector::Raw(code) => Builder::new(Raw::new(code)),
    };

    builder.build().map_err(|e| {
        let reason = if e.kind() == std::io::ErrorKind::PermissionDenied {
            "permission denied - run with sudo, set CAP_PERFMON, or lower perf_event_paranoid"
                .to_string()
        } else {
            format!("perf_event_open failed: {}", e)
        };
        HarnessError::ClockUnavailable {
            clock: format!("event counter '{}'", selector),
            reason,
        }
    })
}

#[cfg(all(target_os = "linux", feature = "perf"))]
impl std::fmt::Debug for EventCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCounters")
            .field("selectors", &self.selectors)
            .field("started", &self.started)
            .field("last", &self.last)
            .finish()
    }
}

/// Stand-in when perf_event support is not built; cannot be constructed.
#[cfg(not(all(target_os = "linux", feature = "perf")))]
#[derive(Debug)]
pub struct EventCounters {
    _private: (),
}

#[cfg(not(all(target_os = "linux", feature = "perf")))]
impl EventCounters {
    /// Event counters require Linux and the `perf` feature.
    pub fn new(_selectors: [Option<EventSelector>; 2]) -> Result<Self> {
        Err(HarnessError::ClockUnavailable {
            clock: "event counters".to_string(),
            reason: "built without perf_event support (Linux with --features perf)".to_string(),
        })
    }

    /// Selectors programmed into each slot.
    pub fn selectors(&self) -> [Option<EventSelector>; 2] {
        [None, None]
    }

    /// No-op.
    #[inline]
    pub fn start(&mut self) {}

    /// No-op.
    #[inline]
    pub fn stop(&mut self) {}

    /// Always empty.
    pub fn counts(&self) -> EventCounts {
        EventCounts::default()
    }
}
