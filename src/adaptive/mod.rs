//! Adaptive iteration sizing.
//!
//! Clock resolution and bracket overhead put an absolute error floor under
//! every measurement. Scaling the repetition count until the workload runs
//! for a target duration (one second by default) makes the elapsed time
//! dominate that floor, so relative error shrinks on fast and slow machines
//! alike without per-machine tuning.
//!
//! The search is a small state machine ([`SizerState`]):
//!
//! ```text
//!            ok, short of target
//!           +-------------------+
//!           v                   |
//!   run(1) -> Growing --run(2k)-+--ok, target met--> Done
//!                 |
//!                 +--failed--> Failed (k/2)
//! ```

mod sizer;
mod state;

pub use sizer::{IterationSizer, DEFAULT_MAX_ITERATIONS, DEFAULT_TARGET_US};
pub use state::SizerState;
