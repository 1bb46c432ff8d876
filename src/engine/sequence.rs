//! Sequence Generator
//!
//! Pure range → values function used to drive sweeps. The range is
//! half-open: `start, start + step, ...` strictly before `stop`, the same
//! length as `numpy.arange`. Values are computed as `start + i * step`
//! rather than by accumulation, so rounding error does not grow along the
//! sequence.

use crate::error::{Result, SimError};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// Largest sequence a single sweep may materialize
pub const MAX_SEQUENCE_LEN: usize = 1_000_000;

/// Order in which a generated sequence is visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepOrder {
    /// Increasing numeric order, regardless of the step's sign
    #[default]
    Ascending,
    /// Uniformly random permutation; a seed makes it reproducible
    Shuffled { seed: Option<u64> },
}

impl SweepOrder {
    pub fn shuffled() -> Self {
        Self::Shuffled { seed: None }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::Shuffled { seed: Some(seed) }
    }
}

impl fmt::Display for SweepOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "ascending"),
            Self::Shuffled { seed: None } => write!(f, "shuffled"),
            Self::Shuffled { seed: Some(seed) } => write!(f, "shuffled (seed {})", seed),
        }
    }
}

/// Number of values in `[start, stop)` stepping by `step`.
///
/// # Errors
///
/// `InvalidRange` if any bound is non-finite, `step` is zero, `step` points
/// away from `stop`, or the range exceeds `MAX_SEQUENCE_LEN`.
pub fn sequence_len(start: f64, stop: f64, step: f64) -> Result<usize> {
    if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
        return Err(SimError::invalid_range(format!(
            "start, stop and step must be finite (got {}, {}, {})",
            start, stop, step
        )));
    }
    if step == 0.0 {
        return Err(SimError::invalid_range("step cannot be zero"));
    }

    let span = stop - start;
    if span == 0.0 {
        return Ok(0);
    }
    if span.signum() != step.signum() {
        return Err(SimError::invalid_range(format!(
            "step {} does not move from {} toward {}",
            step, start, stop
        )));
    }

    let len = (span / step).ceil();
    if !len.is_finite() || len > MAX_SEQUENCE_LEN as f64 {
        return Err(SimError::invalid_range(format!(
            "range {}..{} by {} has more than {} values",
            start, stop, step, MAX_SEQUENCE_LEN
        )));
    }
    // ceil() can overshoot by one when span/step rounds up past an integer
    let mut len = len as usize;
    while len > 0 && !before_stop(start + (len - 1) as f64 * step, stop, step) {
        len -= 1;
    }
    Ok(len)
}

/// True when `value` lies strictly on the `start` side of `stop`
fn before_stop(value: f64, stop: f64, step: f64) -> bool {
    if step > 0.0 { value < stop } else { value > stop }
}

/// Materialize the values of `[start, stop)` by `step` in the given order.
pub fn generate(start: f64, stop: f64, step: f64, order: SweepOrder) -> Result<Vec<f64>> {
    let len = sequence_len(start, stop, step)?;
    let mut values: Vec<f64> = (0..len).map(|i| start + i as f64 * step).collect();

    match order {
        SweepOrder::Ascending => values.sort_by(f64::total_cmp),
        SweepOrder::Shuffled { seed } => {
            let mut rng = match seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            values.shuffle(&mut rng);
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_range() {
        let values = generate(0.0, 10.0, 2.0, SweepOrder::Ascending).unwrap();
        assert_eq!(values, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_fractional_range_excludes_stop() {
        let values = generate(0.0, 1.0, 0.25, SweepOrder::Ascending).unwrap();
        assert_eq!(values, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_partial_last_step_is_included() {
        // ceil((1.0 - 0.0) / 0.3) = 4
        let values = generate(0.0, 1.0, 0.3, SweepOrder::Ascending).unwrap();
        assert_eq!(values.len(), 4);
        assert!(values.iter().all(|v| *v < 1.0));
    }

    #[test]
    fn test_decimal_step_never_reaches_stop() {
        // (1.3 - 1.0) / 0.1 rounds to just above 3
        let values = generate(1.0, 1.3, 0.1, SweepOrder::Ascending).unwrap();
        assert_eq!(values, vec![1.0, 1.1, 1.2]);
        assert_eq!(sequence_len(1.0, 1.3, 0.1).unwrap(), 3);
    }

    #[test]
    fn test_negative_decimal_step_never_reaches_stop() {
        let values = generate(1.3, 1.0, -0.1, SweepOrder::Ascending).unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| *v > 1.0), "{:?}", values);
        assert!((values[0] - 1.1).abs() < 1e-9);
        assert_eq!(values[2], 1.3);
    }

    #[test]
    fn test_descending_step_is_sorted_ascending() {
        let values = generate(5.0, 0.0, -1.0, SweepOrder::Ascending).unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_empty_range() {
        assert!(generate(3.0, 3.0, 1.0, SweepOrder::Ascending)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_zero_step_is_invalid() {
        let err = generate(0.0, 1.0, 0.0, SweepOrder::Ascending).unwrap_err();
        assert!(matches!(err, SimError::InvalidRange(_)));
    }

    #[test]
    fn test_wrong_direction_is_invalid() {
        assert!(matches!(
            generate(0.0, 10.0, -1.0, SweepOrder::Ascending),
            Err(SimError::InvalidRange(_))
        ));
        assert!(matches!(
            generate(10.0, 0.0, 1.0, SweepOrder::Ascending),
            Err(SimError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_non_finite_bounds_are_invalid() {
        assert!(generate(f64::NAN, 1.0, 0.1, SweepOrder::Ascending).is_err());
        assert!(generate(0.0, f64::INFINITY, 0.1, SweepOrder::Ascending).is_err());
    }

    #[test]
    fn test_oversized_range_is_invalid() {
        let err = sequence_len(0.0, 1e9, 1.0).unwrap_err();
        assert!(err.to_string().contains("more than"));
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let a = generate(0.0, 50.0, 1.0, SweepOrder::seeded(42)).unwrap();
        let b = generate(0.0, 50.0, 1.0, SweepOrder::seeded(42)).unwrap();
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(sorted, generate(0.0, 50.0, 1.0, SweepOrder::Ascending).unwrap());
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(0.0, 50.0, 1.0, SweepOrder::seeded(1)).unwrap();
        let b = generate(0.0, 50.0, 1.0, SweepOrder::seeded(2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sweep_order_display() {
        assert_eq!(SweepOrder::Ascending.to_string(), "ascending");
        assert_eq!(SweepOrder::shuffled().to_string(), "shuffled");
        assert_eq!(SweepOrder::seeded(7).to_string(), "shuffled (seed 7)");
    }
}
