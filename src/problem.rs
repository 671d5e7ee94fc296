//! Serialisable fitting problem: weights, four bound vectors and settings.
//!
//! A [`FitProblem`] is the portable form of one call to
//! [`BandwidthFitter::fit`]. It is what a driver reads from disk or receives
//! over the wire; the crate itself does no I/O.
//!
//! ```json
//! {
//!   "matrix":  [[0.0, 0.99], [0.99, 0.0]],
//!   "row_min": [50, 100], "row_max": [50, 100],
//!   "col_min": [0, 0],    "col_max": [150, 60],
//!   "settings": { "gap": 0.001, "max_iterations": 25 }
//! }
//! ```
//!
//! `settings` and any field inside it may be omitted; omitted values take the
//! [`BandwidthFitter::default`] values.
//!
//! # no_std
//!
//! Requires the `serde` feature. Uses `alloc::vec::Vec` only.

use alloc::vec::Vec;

use crate::error::Result;
use crate::fitter::{BandwidthFitter, FitOutcome, FitReport};
use crate::matrix::Matrix;

/// One bandwidth-fitting problem.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct FitProblem {
    /// Initial weights, as a list of equal-length rows.
    pub matrix: Matrix,
    /// Row lower bounds.
    pub row_min: Vec<f64>,
    /// Row upper bounds.
    pub row_max: Vec<f64>,
    /// Column lower bounds.
    pub col_min: Vec<f64>,
    /// Column upper bounds.
    pub col_max: Vec<f64>,
    /// Convergence settings.
    #[serde(default)]
    pub settings: BandwidthFitter,
}

impl FitProblem {
    /// Problem with default settings.
    pub fn new(
        matrix: Matrix,
        row_min: Vec<f64>,
        row_max: Vec<f64>,
        col_min: Vec<f64>,
        col_max: Vec<f64>,
    ) -> Self {
        Self { matrix, row_min, row_max, col_min, col_max, settings: BandwidthFitter::default() }
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: BandwidthFitter) -> Self {
        self.settings = settings;
        self
    }

    /// Run the fitter on a copy of the weights.
    pub fn solve(&self) -> Result<FitOutcome> {
        self.settings.fit(
            self.matrix.clone(),
            &self.row_min,
            &self.row_max,
            &self.col_min,
            &self.col_max,
        )
    }
}

/// Serialisable summary of a solved problem.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct FitSolution {
    /// Fitted weights.
    pub matrix: Matrix,
    /// Row sums of the fitted weights.
    pub row_sums: Vec<f64>,
    /// Column sums of the fitted weights.
    pub col_sums: Vec<f64>,
    /// Run diagnostics.
    pub report: FitReport,
}

impl From<FitOutcome> for FitSolution {
    fn from(outcome: FitOutcome) -> Self {
        Self {
            row_sums: outcome.matrix.row_sums(),
            col_sums: outcome.matrix.col_sums(),
            matrix: outcome.matrix,
            report: outcome.report,
        }
    }
}
