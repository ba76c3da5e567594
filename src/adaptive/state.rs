//! States of the iteration-count search.

use crate::types::Tick;

/// Where the doubling search stands.
///
/// `Growing` is the only non-terminal state. A failed run always lands in
/// `Failed` carrying the last count known to work; reaching the target (or
/// the iteration cap) lands in `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizerState {
    /// The last run succeeded but fell short of the target.
    Growing {
        /// Count that was just run.
        iterations: u64,
        /// Corrected ticks it took.
        elapsed: Tick,
    },

    /// A run failed; the search backed off to the previous count.
    Failed {
        /// Count to use (half the failing count, never below 1).
        last_good: u64,
    },

    /// The last run met the target, or growth had to stop.
    Done {
        /// Count to use.
        iterations: u64,
    },
}

impl SizerState {
    /// True for `Failed` and `Done`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SizerState::Growing { .. })
    }

    /// Iteration count this state recommends.
    pub fn iterations(&self) -> u64 {
        match *self {
            SizerState::Growing { iterations, .. } => iterations,
            SizerState::Failed { last_good } => last_good,
            SizerState::Done { iterations } => iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!SizerState::Growing { iterations: 4, elapsed: 10 }.is_terminal());
        assert!(SizerState::Failed { last_good: 2 }.is_terminal());
        assert!(SizerState::Done { iterations: 8 }.is_terminal());
        assert_eq!(SizerState::Failed { last_good: 2 }.iterations(), 2);
    }
}
