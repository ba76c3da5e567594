//! Result output: canonical report lines, JSON records, terminal summary.

mod json;
pub mod report;
mod terminal;

pub use json::{to_json, to_json_pretty};
#[cfg(unix)]
pub use report::output_latency_ns_fd;
pub use report::{
    bandwidth_mb_per_s, format_bandwidth, format_latency, format_latency_ns, latency_ns,
    latency_us, output_bandwidth, output_latency, write_bandwidth, write_latency,
};
pub use terminal::format_measurement;
