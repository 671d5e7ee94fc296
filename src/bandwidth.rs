/*
 * bandfit-core: iterative proportional fitting with bandwidth margins.
 *
 * This source code is licensed under the MIT License.
 */

//! Bandwidth margins — closed `[min, max]` intervals for row and column sums.
//!
//! A classical IPF target pins every margin to a single value. A bandwidth only
//! says where the margin is *allowed* to be: a sum inside the band is left alone,
//! a sum outside it is pulled to the nearest edge by a multiplicative
//! correction factor.
//!
//! ```text
//!            Below            Within            Above
//!   ─────────────────┤████████████████████├─────────────────
//!   factor = min/sum        min   ..   max       factor = max/sum
//! ```
//!
//! # Invariants
//! - `min <= max` for every [`Bandwidth`], regardless of the order the bounds
//!   were supplied in.
//! - A margin with a non-positive sum always gets the neutral factor `1.0`; it
//!   cannot be rescaled multiplicatively.

use alloc::vec::Vec;
use core::fmt;

use crate::error::{FitError, Result};

/// Matrix axis a margin belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// Row margins (sums across each row).
    Row,
    /// Column margins (sums down each column).
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row => f.write_str("row"),
            Self::Column => f.write_str("column"),
        }
    }
}

/// Where a margin sits relative to its band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarginStatus {
    /// Sum is below `min`.
    Below,
    /// Sum lies in `[min, max]`.
    Within,
    /// Sum is above `max`.
    Above,
}

/// Closed interval `[min, max]` a margin is allowed to occupy.
///
/// Construct through [`Bandwidth::new`] (or one of the shorthands); the fields
/// are read-only so the `min <= max` invariant always holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bandwidth {
    min: f64,
    max: f64,
}

impl Bandwidth {
    /// Band spanning `a` and `b` in either order.
    pub fn new(a: f64, b: f64) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Zero-width band: the margin must equal `value` (classical IPF).
    pub fn fixed(value: f64) -> Self {
        Self { min: value, max: value }
    }

    /// Upper bound only: `[0, value]`.
    pub fn at_most(value: f64) -> Self {
        Self::new(0.0, value)
    }

    /// Lower bound only: `[value, +∞)`.
    pub fn at_least(value: f64) -> Self {
        Self { min: value, max: f64::INFINITY }
    }

    /// Lower edge.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper edge.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Width of the band (`0.0` for a fixed margin).
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Whether `sum` lies inside the band.
    pub fn contains(&self, sum: f64) -> bool {
        self.status(sum) == MarginStatus::Within
    }

    /// Classify `sum` against the band.
    pub fn status(&self, sum: f64) -> MarginStatus {
        if sum < self.min {
            MarginStatus::Below
        } else if sum > self.max {
            MarginStatus::Above
        } else {
            MarginStatus::Within
        }
    }

    /// Multiplicative factor that moves `sum` onto the violated edge.
    ///
    /// `1.0` when the sum is inside the band, and also when the sum is zero or
    /// negative.
    #[inline]
    pub fn correction(&self, sum: f64) -> f64 {
        if sum > 0.0 {
            if sum < self.min {
                return self.min / sum;
            }
            if sum > self.max {
                return self.max / sum;
            }
        }
        1.0
    }

    /// Distance from `sum` to the nearer band edge.
    #[inline]
    pub fn distance(&self, sum: f64) -> f64 {
        (sum - self.min).abs().min((sum - self.max).abs())
    }

    fn check(self, axis: Axis, index: usize) -> Result<Self> {
        if !self.min.is_finite() {
            return Err(FitError::NonFiniteBound { axis, index, value: self.min });
        }
        if self.max.is_nan() {
            return Err(FitError::NonFiniteBound { axis, index, value: self.max });
        }
        Ok(self)
    }
}

/// Pair caller-supplied lower and upper bound vectors into bandwidths.
///
/// Two elementwise reductions: `min(lower[i], upper[i])` and
/// `max(lower[i], upper[i])`. The inputs need not be ordered.
///
/// Rejects vectors of different lengths, NaN anywhere, and bands whose lower
/// edge is infinite. An upper edge of `+∞` is accepted.
pub fn normalize(lower: &[f64], upper: &[f64], axis: Axis) -> Result<Vec<Bandwidth>> {
    if lower.len() != upper.len() {
        return Err(FitError::BoundLengthMismatch { axis, lower: lower.len(), upper: upper.len() });
    }
    lower
        .iter()
        .zip(upper)
        .enumerate()
        .map(|(i, (&lo, &hi))| {
            if lo.is_nan() {
                return Err(FitError::NonFiniteBound { axis, index: i, value: lo });
            }
            if hi.is_nan() {
                return Err(FitError::NonFiniteBound { axis, index: i, value: hi });
            }
            Bandwidth::new(lo, hi).check(axis, i)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn new_orders_bounds() {
        let b = Bandwidth::new(7.0, 3.0);
        assert_eq!(b.min(), 3.0);
        assert_eq!(b.max(), 7.0);
        assert_eq!(b.width(), 4.0);
    }

    #[test]
    fn correction_is_neutral_inside_band() {
        let b = Bandwidth::new(10.0, 20.0);
        assert_eq!(b.correction(10.0), 1.0);
        assert_eq!(b.correction(15.0), 1.0);
        assert_eq!(b.correction(20.0), 1.0);
    }

    #[test]
    fn correction_pulls_to_nearest_edge() {
        let b = Bandwidth::new(10.0, 20.0);
        assert_eq!(b.correction(5.0), 2.0);
        assert_eq!(b.correction(40.0), 0.5);
    }

    #[test]
    fn zero_or_negative_sum_is_never_rescaled() {
        let b = Bandwidth::new(10.0, 20.0);
        assert_eq!(b.correction(0.0), 1.0);
        assert_eq!(b.correction(-3.0), 1.0);
    }

    #[test]
    fn distance_uses_nearer_edge() {
        let b = Bandwidth::new(10.0, 20.0);
        assert_eq!(b.distance(4.0), 6.0);
        assert_eq!(b.distance(23.0), 3.0);
        assert_eq!(Bandwidth::fixed(5.0).distance(8.0), 3.0);
    }

    #[test]
    fn at_least_has_open_top() {
        let b = Bandwidth::at_least(2.0);
        assert_eq!(b.status(1e300), MarginStatus::Within);
        assert_eq!(b.correction(1.0), 2.0);
        assert_eq!(b.distance(1.0), 1.0);
    }

    #[test]
    fn status_classifies_sums() {
        let b = Bandwidth::at_most(60.0);
        assert_eq!(b.status(-1.0), MarginStatus::Below);
        assert_eq!(b.status(0.0), MarginStatus::Within);
        assert_eq!(b.status(60.0), MarginStatus::Within);
        assert_eq!(b.status(60.5), MarginStatus::Above);
        assert!(b.contains(30.0));
    }

    #[test]
    fn normalize_is_elementwise_min_max() {
        let bands = normalize(&[0.0, 175.0, 5.0], &[150.0, 0.0, 5.0], Axis::Column).unwrap();
        assert_eq!(
            bands,
            vec![Bandwidth::new(0.0, 150.0), Bandwidth::new(0.0, 175.0), Bandwidth::fixed(5.0)]
        );
        assert!(bands.iter().all(|b| b.min() <= b.max()));
    }

    #[test]
    fn normalize_rejects_length_mismatch() {
        let err = normalize(&[1.0, 2.0], &[3.0], Axis::Row).unwrap_err();
        assert_eq!(err, FitError::BoundLengthMismatch { axis: Axis::Row, lower: 2, upper: 1 });
    }

    #[test]
    fn normalize_rejects_nan_and_infinite_floor() {
        let err = normalize(&[1.0, f64::NAN], &[2.0, 2.0], Axis::Row).unwrap_err();
        assert!(matches!(err, FitError::NonFiniteBound { axis: Axis::Row, index: 1, .. }));

        let err = normalize(&[f64::NEG_INFINITY], &[2.0], Axis::Column).unwrap_err();
        assert!(matches!(err, FitError::NonFiniteBound { axis: Axis::Column, index: 0, .. }));

        let err = normalize(&[f64::INFINITY], &[f64::INFINITY], Axis::Row).unwrap_err();
        assert!(matches!(err, FitError::NonFiniteBound { index: 0, .. }));
    }

    #[test]
    fn normalize_accepts_open_upper_bound() {
        let bands = normalize(&[3.0], &[f64::INFINITY], Axis::Row).unwrap();
        assert_eq!(bands[0], Bandwidth::at_least(3.0));
    }
}
