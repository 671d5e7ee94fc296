//! Configuration errors reported at the fitting boundary.
//!
//! The iteration loop itself never fails: division by a zero margin is
//! short-circuited to a neutral factor and non-convergence is reported through
//! [`FitReport::stop`](crate::fitter::FitReport::stop). Everything here is
//! detected before the first iteration runs.

use thiserror::Error;

use crate::bandwidth::Axis;

/// Result alias for fallible fitting operations.
pub type Result<T> = core::result::Result<T, FitError>;

/// Malformed input or settings rejected before fitting starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// The iteration cap is zero, so no iteration would ever run.
    #[error("iteration cap must be at least 1")]
    ZeroIterations,

    /// The stall limit is zero; the stall counter could never reach it.
    #[error("stall limit must be at least 1")]
    ZeroStallLimit,

    /// A convergence tolerance is negative or not a number.
    #[error("{name} must be a non-negative number, got {value}")]
    InvalidTolerance {
        /// Setting name (`gap` or `gap_improvement`).
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A matrix was built from zero rows or zero columns.
    #[error("matrix must have at least one row and one column")]
    EmptyMatrix,

    /// A row has a different length from the first row.
    #[error("row {row} has {len} entries, expected {expected}")]
    RaggedRow {
        /// Index of the offending row.
        row: usize,
        /// Its length.
        len: usize,
        /// Length of the first row.
        expected: usize,
    },

    /// A bandwidth vector does not match the matrix dimension along its axis.
    #[error("{axis} bandwidths have {len} entries but the matrix has {expected} {axis}s")]
    ShapeMismatch {
        /// Axis being checked.
        axis: Axis,
        /// Supplied length.
        len: usize,
        /// Matrix dimension along `axis`.
        expected: usize,
    },

    /// Lower and upper bound vectors for one axis differ in length.
    #[error("{axis} lower bounds have {lower} entries but upper bounds have {upper}")]
    BoundLengthMismatch {
        /// Axis being checked.
        axis: Axis,
        /// Length of the lower bound vector.
        lower: usize,
        /// Length of the upper bound vector.
        upper: usize,
    },

    /// A bound is NaN or negative infinity.
    #[error("{axis} {index} has a non-finite bound ({value})")]
    NonFiniteBound {
        /// Axis of the offending margin.
        axis: Axis,
        /// Index of the offending margin.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Flat storage length is not `rows × cols`.
    #[error("matrix data has {len} entries, expected {rows}×{cols}")]
    DataLength {
        /// Supplied number of entries.
        len: usize,
        /// Declared row count.
        rows: usize,
        /// Declared column count.
        cols: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_axis() {
        let e = FitError::ShapeMismatch { axis: Axis::Column, len: 4, expected: 5 };
        assert_eq!(e.to_string(), "column bandwidths have 4 entries but the matrix has 5 columns");
    }

    #[test]
    fn zero_iterations_message() {
        assert_eq!(FitError::ZeroIterations.to_string(), "iteration cap must be at least 1");
    }
}
