//! Error types for the timing harness.
//!
//! Configuration problems (an unusable clock source, malformed timing
//! arguments) and statistics invariant violations are surfaced as
//! [`HarnessError`] and are meant to end the run. Workload failures are
//! reported through [`WorkloadError`]; the iteration sizer absorbs them,
//! everything else propagates them.

use thiserror::Error;

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Status returned by a workload that could not complete its repetitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkloadError {
    /// A resource limit was hit (file descriptors, processes, memory).
    ///
    /// While sizing, this means "stop growing": the last good count is used.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Any other failure of the workload itself.
    #[error("workload failed: {0}")]
    Failed(String),
}

/// Misuse of a [`SampleSet`](crate::statistics::SampleSet).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleSetError {
    /// `add` was called before a capacity was declared.
    #[error("sample set used before a capacity was declared")]
    NoCapacity,

    /// More samples were added than the declared capacity allows.
    #[error("sample set is full (capacity {capacity})")]
    CapacityExceeded {
        /// Declared capacity.
        capacity: usize,
    },

    /// `finish` was called with no samples.
    #[error("trimmed mean of an empty sample set")]
    Empty,

    /// Trimming would discard every sample.
    #[error("trimming {tail} samples from each end of {count} leaves nothing to average")]
    TrimConsumesAll {
        /// Samples present.
        count: usize,
        /// Samples discarded from each end.
        tail: usize,
    },

    /// Tail fraction outside `[0, 0.5)`.
    #[error("tail fraction {0} is outside [0, 0.5)")]
    InvalidTailFraction(f64),
}

/// Errors from the timing harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The requested clock source cannot be used on this machine.
    ///
    /// Raised at configuration time. The harness never substitutes another
    /// clock, since results from different sources are not comparable.
    #[error("clock source '{clock}' is unavailable: {reason}")]
    ClockUnavailable {
        /// Name of the requested source.
        clock: String,
        /// Why it could not be initialized.
        reason: String,
    },

    /// An event counter selector could not be parsed or programmed.
    #[error("invalid event counter selector '{0}'")]
    InvalidEventSelector(String),

    /// Malformed timing arguments on the command line.
    #[error("invalid timing arguments: {0}")]
    InvalidArguments(String),

    /// A statistics invariant was violated.
    #[error(transparent)]
    SampleSet(#[from] SampleSetError),

    /// The workload failed during a reported measurement.
    #[error(transparent)]
    Workload(#[from] WorkloadError),

    /// Writing a result failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
