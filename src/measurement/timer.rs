//! Platform time sources.
//!
//! - [`WallClock`]: monotonic wall clock, microsecond ticks, always available
//! - [`CycleCounter`]: `lfence; rdtsc` on x86_64, `isb; mrs cntvct_el0` on
//!   aarch64. Unavailable elsewhere; there is no software fallback.

use std::hint::black_box as std_black_box;
use std::time::{Duration, Instant};

use crate::error::{HarnessError, Result};
use crate::statistics::median;
use crate::types::{ClockMultiplier, Tick};

use super::cycle_timer::TickSource;

/// Wrapper around `std::hint::black_box` for workload bodies.
///
/// Keeps the compiler from deleting or hoisting the work being timed.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

/// True when this build has a hardware cycle counter to read.
pub const fn cycle_counter_supported() -> bool {
    cfg!(any(target_arch = "x86_64", target_arch = "aarch64"))
}

/// Read the hardware cycle counter with serialization.
///
/// On x86_64, `lfence` makes prior instructions retire before `rdtsc`.
/// On aarch64, `isb` does the same before reading `cntvct_el0`.
#[inline]
pub fn read_cycle_counter() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        rdtsc_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        cntvct_aarch64()
    }

    // CycleCounter::new refuses to construct here, so this is never read.
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        0
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn rdtsc_x86_64() -> u64 {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let cycles: u64;
    unsafe {
        std::arch::asm!(
            "lfence",
            "rdtsc",
            "shl rdx, 32",
            "or rax, rdx",
            out("rax") cycles,
            out("rdx") _,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
    cycles
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn cntvct_aarch64() -> u64 {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let ticks: u64;
    unsafe {
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) ticks,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
    ticks
}

/// Monotonic wall clock with microsecond ticks.
#[derive(Debug, Clone)]
pub struct WallClock {
    started: Instant,
}

impl WallClock {
    /// Create a wall clock. Always succeeds.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for WallClock {
    #[inline]
    fn start(&mut self) {
        self.started = Instant::now();
    }

    #[inline]
    fn stop(&mut self) -> Tick {
        let elapsed = self.started.elapsed();
        u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
    }

    fn name(&self) -> &'static str {
        "wall"
    }
}

/// Hardware cycle counter.
///
/// Ticks are in the counter's native unit: core cycles for an invariant TSC,
/// timer ticks for `cntvct_el0`. Use a [`ClockMultiplier`] to report real
/// time.
#[derive(Debug, Clone)]
pub struct CycleCounter {
    start: u64,
}

impl CycleCounter {
    /// Create a cycle counter.
    ///
    /// # Errors
    ///
    /// [`HarnessError::ClockUnavailable`] on architectures without a
    /// supported counter.
    pub fn new() -> Result<Self> {
        if !cycle_counter_supported() {
            return Err(HarnessError::ClockUnavailable {
                clock: "cycles".to_string(),
                reason: format!(
                    "no cycle counter support for target architecture '{}'",
                    std::env::consts::ARCH
                ),
            });
        }
        Ok(Self {
            start: read_cycle_counter(),
        })
    }
}

impl TickSource for CycleCounter {
    #[inline]
    fn start(&mut self) {
        self.start = read_cycle_counter();
    }

    #[inline]
    fn stop(&mut self) -> Tick {
        // A counter that went backwards (migration across unsynchronized
        // sockets) reads as zero elapsed.
        read_cycle_counter().saturating_sub(self.start)
    }

    fn name(&self) -> &'static str {
        #[cfg(target_arch = "aarch64")]
        {
            "cntvct_el0"
        }
        #[cfg(not(target_arch = "aarch64"))]
        {
            "rdtsc"
        }
    }
}

/// Estimate microseconds per cycle-counter tick against the wall clock.
///
/// Runs `rounds` sleeps of `window` each and takes the median ratio. The
/// result is a suggestion for operators who don't know the counter rate;
/// the harness never applies it on its own.
///
/// # Errors
///
/// [`HarnessError::ClockUnavailable`] without a cycle counter, or if no
/// round produced a usable ratio.
pub fn estimate_clock_multiplier(rounds: usize, window: Duration) -> Result<ClockMultiplier> {
    if !cycle_counter_supported() {
        return Err(HarnessError::ClockUnavailable {
            clock: "cycles".to_string(),
            reason: "cannot estimate a multiplier without a cycle counter".to_string(),
        });
    }

    let mut ratios = Vec::with_capacity(rounds);
    for _ in 0..rounds {
        let start_ticks = read_cycle_counter();
        let start_time = Instant::now();

        std::thread::sleep(window);

        let end_ticks = read_cycle_counter();
        let elapsed_us = start_time.elapsed().as_secs_f64() * 1e6;
        let ticks = end_ticks.saturating_sub(start_ticks);
        if ticks == 0 || elapsed_us <= 0.0 {
            continue;
        }
        ratios.push(elapsed_us / ticks as f64);
    }

    median(&mut ratios)
        .and_then(ClockMultiplier::new)
        .ok_or_else(|| HarnessError::ClockUnavailable {
            clock: "cycles".to_string(),
            reason: "cycle counter did not advance during calibration".to_string(),
        })
}
