//! Canonical one-line result formats.
//!
//! Every benchmark reports exactly one number per run, printed with four
//! decimals, optionally followed by the auxiliary event counter values:
//!
//! - bandwidth: `MB/s [bytes c1 c2]`, with raw counter totals
//! - latency: `us/iter [c1 c2]`, with counters divided by the iteration count
//! - latency to a descriptor: `ns/iter [c1 c2]` written with a single `write`
//!
//! Only active counters are appended. Ticks are scaled by the clock
//! multiplier here and nowhere else.

use std::io::{self, Write};

use crate::error::Result;
use crate::types::{ClockMultiplier, EventCounts, Tick};

/// Bytes per megabyte in bandwidth figures.
pub const MB: f64 = 1024.0 * 1024.0;

/// MB/s for `bytes` moved in `ticks`. Zero when no time elapsed.
pub fn bandwidth_mb_per_s(bytes: u64, ticks: Tick, multiplier: ClockMultiplier) -> f64 {
    let usecs = multiplier.to_us(ticks as f64);
    if usecs > 0.0 {
        (bytes as f64 / MB) / (usecs / 1_000_000.0)
    } else {
        0.0
    }
}

/// Microseconds per iteration. Zero when no iterations ran.
pub fn latency_us(ticks: Tick, iterations: u64, multiplier: ClockMultiplier) -> f64 {
    if iterations == 0 {
        return 0.0;
    }
    multiplier.to_us(ticks as f64 / iterations as f64)
}

/// Nanoseconds per iteration. Zero when no iterations ran.
pub fn latency_ns(ticks: Tick, iterations: u64, multiplier: ClockMultiplier) -> f64 {
    latency_us(ticks, iterations, multiplier) * 1000.0
}

fn push_counts(line: &mut String, counts: impl Iterator<Item = u64>) {
    for value in counts {
        line.push(' ');
        line.push_str(&value.to_string());
    }
}

/// Format a bandwidth line (without the trailing newline).
///
/// With active counters the byte count precedes the raw totals so that
/// the totals can be related to the amount of data moved.
pub fn format_bandwidth(
    bytes: u64,
    ticks: Tick,
    multiplier: ClockMultiplier,
    events: &EventCounts,
) -> String {
    let mut line = format!("{:.4}", bandwidth_mb_per_s(bytes, ticks, multiplier));
    if !events.is_empty() {
        line.push(' ');
        line.push_str(&bytes.to_string());
        push_counts(&mut line, events.active());
    }
    line
}

/// Format a latency line in microseconds (without the trailing newline).
pub fn format_latency(
    ticks: Tick,
    iterations: u64,
    multiplier: ClockMultiplier,
    events: &EventCounts,
) -> String {
    let mut line = format!("{:.4}", latency_us(ticks, iterations, multiplier));
    push_counts(&mut line, events.per_iteration(iterations).active());
    line
}

/// Format a latency line in nanoseconds, newline included.
pub fn format_latency_ns(
    ticks: Tick,
    iterations: u64,
    multiplier: ClockMultiplier,
    events: &EventCounts,
) -> String {
    let mut line = format!("{:.4}", latency_ns(ticks, iterations, multiplier));
    push_counts(&mut line, events.per_iteration(iterations).active());
    line.push('\n');
    line
}

/// Write a bandwidth line to `out`.
pub fn write_bandwidth<W: Write>(
    out: &mut W,
    bytes: u64,
    ticks: Tick,
    multiplier: ClockMultiplier,
    events: &EventCounts,
) -> Result<()> {
    writeln!(out, "{}", format_bandwidth(bytes, ticks, multiplier, events))?;
    Ok(())
}

/// Write a latency line to `out`.
pub fn write_latency<W: Write>(
    out: &mut W,
    ticks: Tick,
    iterations: u64,
    multiplier: ClockMultiplier,
    events: &EventCounts,
) -> Result<()> {
    writeln!(out, "{}", format_latency(ticks, iterations, multiplier, events))?;
    Ok(())
}

/// Print a bandwidth line to stdout.
pub fn output_bandwidth(
    bytes: u64,
    ticks: Tick,
    multiplier: ClockMultiplier,
    events: &EventCounts,
) -> Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_bandwidth(&mut lock, bytes, ticks, multiplier, events)?;
    lock.flush()?;
    Ok(())
}

/// Print a latency line to stdout.
pub fn output_latency(
    ticks: Tick,
    iterations: u64,
    multiplier: ClockMultiplier,
    events: &EventCounts,
) -> Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_latency(&mut lock, ticks, iterations, multiplier, events)?;
    lock.flush()?;
    Ok(())
}

/// Write a nanosecond latency line directly to an open descriptor.
///
/// The line goes out in a single `write(2)` so that lines from several
/// processes sharing the descriptor do not interleave. A short write is an
/// error.
#[cfg(unix)]
pub fn output_latency_ns_fd(
    fd: std::os::fd::BorrowedFd<'_>,
    ticks: Tick,
    iterations: u64,
    multiplier: ClockMultiplier,
    events: &EventCounts,
) -> Result<()> {
    use std::os::fd::AsRawFd;

    let line = format_latency_ns(ticks, iterations, multiplier, events);
    let buf = line.as_bytes();

    // SAFETY: `fd` is borrowed for the duration of the call and `buf` is a
    // valid slice of `buf.len()` bytes.
    let written = unsafe {
        libc::write(
            fd.as_raw_fd(),
            buf.as_ptr() as *const libc::c_void,
            buf.len(),
        )
    };

    if written < 0 {
        return Err(io::Error::last_os_error().into());
    }
    if written as usize != buf.len() {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("short write: {} of {} bytes", written, buf.len()),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: ClockMultiplier = ClockMultiplier::IDENTITY;

    #[test]
    fn test_latency_line() {
        let line = format_latency(2000, 1000, ONE, &EventCounts::default());
        assert_eq!(line, "2.0000");
    }

    #[test]
    fn test_bandwidth_line() {
        let line = format_bandwidth(10 * 1024 * 1024, 1_000_000, ONE, &EventCounts::default());
        assert_eq!(line, "10.0000");
    }

    #[test]
    fn test_zero_ticks_is_zero_bandwidth() {
        assert_eq!(bandwidth_mb_per_s(1 << 20, 0, ONE), 0.0);
        let line = format_bandwidth(1 << 20, 0, ONE, &EventCounts::default());
        assert_eq!(line, "0.0000");
    }

    #[test]
    fn test_multiplier_applies() {
        let half = ClockMultiplier::new(0.5).unwrap();
        assert_eq!(format_latency(2000, 1000, half, &EventCounts::default()), "1.0000");
        assert_eq!(
            format_latency_ns(2000, 1000, half, &EventCounts::default()),
            "1000.0000\n"
        );
    }

    #[test]
    fn test_counter_suffixes() {
        let events = EventCounts {
            c1: Some(5_000),
            c2: Some(300),
        };
        assert_eq!(format_latency(2000, 1000, ONE, &events), "2.0000 5 0");
        assert_eq!(
            format_bandwidth(1 << 20, 1_000_000, ONE, &events),
            "1.0000 1048576 5000 300"
        );

        let only_second = EventCounts { c1: None, c2: Some(40) };
        assert_eq!(format_latency_ns(10, 2, ONE, &only_second), "5000.0000 20\n");
    }

    #[test]
    fn test_zero_iterations_latency() {
        assert_eq!(latency_us(100, 0, ONE), 0.0);
    }

    #[test]
    fn test_write_latency_to_buffer() {
        let mut buf = Vec::new();
        write_latency(&mut buf, 1500, 1000, ONE, &EventCounts::default()).unwrap();
        assert_eq!(buf, b"1.5000\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_latency_ns_to_descriptor() {
        use std::io::Read;
        use std::os::fd::AsFd;

        let path = std::env::temp_dir().join(format!("hbench-report-{}", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        output_latency_ns_fd(file.as_fd(), 3, 2, ONE, &EventCounts::default()).unwrap();
        drop(file);

        let mut contents = String::new();
        std::fs::File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(contents, "1500.0000\n");
    }
}
