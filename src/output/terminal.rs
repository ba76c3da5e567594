//! Human-readable measurement summary for terminals.
//!
//! Meant for stderr diagnostics; the canonical stdout line comes from
//! [`report`](super::report).

use colored::Colorize;

use crate::result::Measurement;

/// Format a Measurement as a short coloured summary.
///
/// `bytes` is the total data moved by the run, for bandwidth workloads.
pub fn format_measurement(measurement: &Measurement, bytes: Option<u64>) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(48);

    output.push_str("hbench-timing\n");
    output.push_str(&sep);
    output.push('\n');

    output.push_str(&format!(
        "  Clock:      {} (x{} us/tick)\n",
        measurement.clock, measurement.multiplier
    ));
    output.push_str(&format!("  Iterations: {}\n", measurement.iterations));
    output.push_str(&format!(
        "  Elapsed:    {} ticks ({:.1} us)\n",
        measurement.ticks,
        measurement.elapsed_us()
    ));
    output.push('\n');

    if measurement.is_clamped() {
        output.push_str(&format!(
            "  {}\n",
            "\u{26A0} Run did not exceed the bracket overhead; reported as zero"
                .yellow()
                .bold()
        ));
    } else {
        output.push_str(&format!(
            "  Latency:    {} us/iter\n",
            format!("{:.4}", measurement.latency_us()).as_str().bold()
        ));
        if let Some(bytes) = bytes {
            output.push_str(&format!(
                "  Bandwidth:  {} MB/s\n",
                format!("{:.4}", measurement.bandwidth_mb_per_s(bytes)).as_str().bold()
            ));
        }
    }

    let per_iter = measurement.events.per_iteration(measurement.iterations);
    for (label, total, each) in [
        ("c1", measurement.events.c1, per_iter.c1),
        ("c2", measurement.events.c2, per_iter.c2),
    ] {
        if let (Some(total), Some(each)) = (total, each) {
            output.push_str(&format!(
                "  {}:         {} total, {} per iter\n",
                label.cyan(),
                total,
                each
            ));
        }
    }

    output.push_str(&sep);
    output.push('\n');
    output
}
