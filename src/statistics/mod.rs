//! Statistical helpers for the timing core.
//!
//! - Trimmed-mean aggregation of repeated tick measurements, used by the
//!   overhead calibrator and by clients estimating their own fixed costs
//! - Quantiles for clock-rate estimation

mod quantile;
mod trimmed_mean;

pub use quantile::{compute_quantile, median};
pub use trimmed_mean::{tail_size, trimmed_mean, SampleSet};
