//! Center-weighted (trimmed) averaging of repeated measurements.
//!
//! A [`SampleSet`] is declared with a capacity and a tail fraction, filled
//! with `add`, and consumed by `finish`, which sorts the samples, discards
//! `floor(count * tail_fraction)` values from each end and averages what is
//! left. Discarding both tails rejects preemption spikes and cold-cache
//! runs on one side and clock quantization artifacts on the other.

use crate::error::SampleSetError;
use crate::types::Tick;

/// Growable, capacity-bounded collection of tick samples.
///
/// After `finish` the set returns to the undeclared state and must be
/// [`reset`](SampleSet::reset) before it is filled again.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<Tick>,
    capacity: Option<usize>,
    tail_fraction: f64,
}

impl SampleSet {
    /// Create an undeclared sample set. `add` fails until `reset` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sample set ready to accept up to `capacity` samples.
    pub fn with_capacity(capacity: usize, tail_fraction: f64) -> Result<Self, SampleSetError> {
        let mut set = Self::new();
        set.reset(capacity, tail_fraction)?;
        Ok(set)
    }

    /// Declare capacity and tail fraction, discarding any held samples.
    ///
    /// Requires `capacity >= 1` and `tail_fraction` in `[0, 0.5)`.
    pub fn reset(&mut self, capacity: usize, tail_fraction: f64) -> Result<(), SampleSetError> {
        if capacity == 0 {
            return Err(SampleSetError::NoCapacity);
        }
        if !(0.0..0.5).contains(&tail_fraction) {
            return Err(SampleSetError::InvalidTailFraction(tail_fraction));
        }
        self.samples.clear();
        self.samples.reserve(capacity);
        self.capacity = Some(capacity);
        self.tail_fraction = tail_fraction;
        Ok(())
    }

    /// Append one sample.
    pub fn add(&mut self, sample: Tick) -> Result<(), SampleSetError> {
        let capacity = self.capacity.ok_or(SampleSetError::NoCapacity)?;
        if self.samples.len() >= capacity {
            return Err(SampleSetError::CapacityExceeded { capacity });
        }
        self.samples.push(sample);
        Ok(())
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples are held.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Declared capacity, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Compute the trimmed mean and return the set to the undeclared state.
    ///
    /// Fewer samples than the declared capacity is fine; the tail size is
    /// computed from the samples actually present. The set is drained even
    /// when an error is returned.
    pub fn finish(&mut self) -> Result<f64, SampleSetError> {
        let mut samples = std::mem::take(&mut self.samples);
        let tail_fraction = self.tail_fraction;
        self.capacity = None;
        self.tail_fraction = 0.0;

        trimmed_mean(&mut samples, tail_fraction)
    }
}

/// Number of samples discarded from each end of a set of `count` samples.
#[inline]
pub fn tail_size(count: usize, tail_fraction: f64) -> usize {
    (count as f64 * tail_fraction).floor() as usize
}

/// Trimmed mean of `data` (sorted in place).
///
/// Exactly `len - 2 * tail_size(len, tail_fraction)` samples contribute.
pub fn trimmed_mean(data: &mut [Tick], tail_fraction: f64) -> Result<f64, SampleSetError> {
    if !(0.0..0.5).contains(&tail_fraction) {
        return Err(SampleSetError::InvalidTailFraction(tail_fraction));
    }
    let count = data.len();
    if count == 0 {
        return Err(SampleSetError::Empty);
    }
    let tail = tail_size(count, tail_fraction);
    if 2 * tail >= count {
        return Err(SampleSetError::TrimConsumesAll { count, tail });
    }

    data.sort_unstable();
    let kept = &data[tail..count - tail];
    let sum: u128 = kept.iter().map(|&t| u128::from(t)).sum();
    Ok(sum as f64 / kept.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_two_from_each_end() {
        let mut set = SampleSet::with_capacity(10, 0.2).unwrap();
        for v in [5, 1, 9, 2, 8, 3, 7, 4, 6, 0] {
            set.add(v).unwrap();
        }
        assert_eq!(set.finish().unwrap(), 4.5);
    }

    #[test]
    fn test_zero_tail_is_plain_mean() {
        let mut data = vec![1, 2, 3, 10];
        assert_eq!(trimmed_mean(&mut data, 0.0).unwrap(), 4.0);
    }

    #[test]
    fn test_add_before_declare_fails() {
        let mut set = SampleSet::new();
        assert_eq!(set.add(1), Err(SampleSetError::NoCapacity));
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut set = SampleSet::with_capacity(2, 0.0).unwrap();
        set.add(1).unwrap();
        set.add(2).unwrap();
        assert_eq!(set.add(3), Err(SampleSetError::CapacityExceeded { capacity: 2 }));
    }

    #[test]
    fn test_finish_empty_fails() {
        let mut set = SampleSet::with_capacity(4, 0.1).unwrap();
        assert_eq!(set.finish(), Err(SampleSetError::Empty));
    }

    #[test]
    fn test_trim_consuming_everything_fails() {
        let mut data = vec![1, 2];
        assert_eq!(
            trimmed_mean(&mut data, 0.49),
            Ok(1.5),
            "floor(2 * 0.49) = 0, nothing trimmed"
        );

        let mut set = SampleSet::with_capacity(10, 0.45).unwrap();
        set.add(1).unwrap();
        set.add(2).unwrap();
        set.add(3).unwrap();
        // floor(3 * 0.45) = 1, 2 * 1 < 3
        assert_eq!(set.finish(), Ok(2.0));

        let mut data = vec![7; 10];
        assert!(trimmed_mean(&mut data, 0.5).is_err());
    }

    #[test]
    fn test_partial_fill_uses_actual_count() {
        let mut set = SampleSet::with_capacity(100, 0.2).unwrap();
        for v in [100, 1, 2, 3, 4] {
            set.add(v).unwrap();
        }
        // floor(5 * 0.2) = 1: drops 1 and 100
        assert_eq!(set.finish().unwrap(), 3.0);
    }

    #[test]
    fn test_finish_resets_for_reuse() {
        let mut set = SampleSet::with_capacity(3, 0.0).unwrap();
        set.add(3).unwrap();
        set.finish().unwrap();
        assert!(set.is_empty());
        assert_eq!(set.capacity(), None);
        assert_eq!(set.add(1), Err(SampleSetError::NoCapacity));

        set.reset(1, 0.0).unwrap();
        set.add(9).unwrap();
        assert_eq!(set.finish().unwrap(), 9.0);
    }

    #[test]
    fn test_reset_validates_arguments() {
        let mut set = SampleSet::new();
        assert_eq!(set.reset(0, 0.1), Err(SampleSetError::NoCapacity));
        assert_eq!(set.reset(4, 0.5), Err(SampleSetError::InvalidTailFraction(0.5)));
        assert_eq!(set.reset(4, -0.1), Err(SampleSetError::InvalidTailFraction(-0.1)));
    }

    #[test]
    fn test_large_ticks_do_not_overflow() {
        let mut data = vec![u64::MAX, u64::MAX];
        assert_eq!(trimmed_mean(&mut data, 0.0).unwrap(), u64::MAX as f64);
    }
}
