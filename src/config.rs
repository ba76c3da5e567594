//! Configuration for the timing harness.

use std::env;

use serde::{Deserialize, Serialize};

use crate::adaptive::{DEFAULT_MAX_ITERATIONS, DEFAULT_TARGET_US};
use crate::measurement::{CalibrationConfig, ClockSpec, EventSelector};
use crate::types::ClockMultiplier;

/// Configuration options for [`Harness`](crate::Harness).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Clock source (default: wall clock).
    pub clock: ClockSpec,

    /// Microseconds per native tick (default: 1.0).
    ///
    /// Only meaningful for the cycle counter when the CPU frequency is not
    /// otherwise known.
    pub multiplier: ClockMultiplier,

    /// Real microseconds the sized workload should run for (default: 1s).
    pub target_us: f64,

    /// Overhead calibration trials (default: 10).
    pub overhead_outer: usize,

    /// Empty brackets averaged per calibration trial (default: 100).
    pub overhead_inner: usize,

    /// Fraction of trials trimmed from each end (default: 0.2).
    pub overhead_tail_fraction: f64,

    /// Upper bound on the sized iteration count (default: 2^32).
    pub max_iterations: u64,

    /// Measure exactly one iteration, without sizing or priming.
    pub cold_cache: bool,

    /// Auxiliary event counters (`-c1`, `-c2`).
    pub events: [Option<EventSelector>; 2],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock: ClockSpec::WallClock,
            multiplier: ClockMultiplier::IDENTITY,
            target_us: DEFAULT_TARGET_US,
            overhead_outer: 10,
            overhead_inner: 100,
            overhead_tail_fraction: 0.2,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            cold_cache: false,
            events: [None, None],
        }
    }
}

impl Config {
    /// Apply `HBENCH_*` environment overrides.
    ///
    /// Recognised variables: `HBENCH_CLOCK`, `HBENCH_CLOCK_MULTIPLIER`,
    /// `HBENCH_TARGET_US`, `HBENCH_MAX_ITERATIONS`, `HBENCH_COLD_CACHE`.
    /// Values that do not parse are ignored.
    pub fn from_env(mut self) -> Self {
        if let Some(clock) = parse_clock_env("HBENCH_CLOCK") {
            self.clock = clock;
        }
        if let Some(m) = parse_f64_env("HBENCH_CLOCK_MULTIPLIER").and_then(ClockMultiplier::new) {
            self.multiplier = m;
        }
        if let Some(t) = parse_f64_env("HBENCH_TARGET_US").filter(|t| t.is_finite() && *t > 0.0) {
            self.target_us = t;
        }
        if let Some(n) = parse_u64_env("HBENCH_MAX_ITERATIONS").filter(|&n| n > 0) {
            self.max_iterations = n;
        }
        if let Some(cold) = parse_bool_env("HBENCH_COLD_CACHE") {
            self.cold_cache = cold;
        }
        self
    }

    /// Calibration parameters taken from this configuration.
    pub fn calibration_config(&self) -> CalibrationConfig {
        CalibrationConfig {
            outer: self.overhead_outer,
            inner: self.overhead_inner,
            tail_fraction: self.overhead_tail_fraction,
        }
    }

    /// True if any auxiliary counter is selected.
    pub fn has_events(&self) -> bool {
        self.events.iter().any(Option::is_some)
    }
}

fn parse_clock_env(key: &str) -> Option<ClockSpec> {
    ClockSpec::by_name(&env::var(key).ok()?).ok()
}

fn parse_u64_env(key: &str) -> Option<u64> {
    env::var(key).ok()?.parse().ok()
}

fn parse_f64_env(key: &str) -> Option<f64> {
    env::var(key).ok()?.parse().ok()
}

fn parse_bool_env(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.clock, ClockSpec::WallClock);
        assert_eq!(config.multiplier, ClockMultiplier::IDENTITY);
        assert_eq!(config.target_us, 1_000_000.0);
        assert_eq!(config.max_iterations, 1 << 32);
        assert!(!config.has_events());
        assert_eq!(config.calibration_config(), CalibrationConfig::default());
    }

    #[test]
    fn test_deserialized_multiplier_is_validated() {
        let mut value = serde_json::to_value(Config::default()).unwrap();
        let back: Config = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, Config::default());

        for bad in [0.0, -1.0] {
            value["multiplier"] = serde_json::json!(bad);
            assert!(serde_json::from_value::<Config>(value.clone()).is_err());
        }
    }

    // All env handling lives in one test: the process environment is shared
    // between test threads.
    #[test]
    fn test_env_overrides() {
        env::set_var("HBENCH_CLOCK", "cycles");
        env::set_var("HBENCH_CLOCK_MULTIPLIER", "0.0005");
        env::set_var("HBENCH_TARGET_US", "not-a-number");
        env::set_var("HBENCH_MAX_ITERATIONS", "4096");
        env::set_var("HBENCH_COLD_CACHE", "true");

        let config = Config::default().from_env();

        for key in [
            "HBENCH_CLOCK",
            "HBENCH_CLOCK_MULTIPLIER",
            "HBENCH_TARGET_US",
            "HBENCH_MAX_ITERATIONS",
            "HBENCH_COLD_CACHE",
        ] {
            env::remove_var(key);
        }

        assert_eq!(config.clock, ClockSpec::CycleCounter);
        assert_eq!(config.multiplier.us_per_tick(), 0.0005);
        assert_eq!(config.target_us, 1_000_000.0);
        assert_eq!(config.max_iterations, 4096);
        assert!(config.cold_cache);
    }
}
