/*
 * bandfit-core: iterative proportional fitting with bandwidth margins.
 *
 * This source code is licensed under the MIT License.
 */

//! Bandwidth-constrained iterative proportional fitting.
//!
//! Each iteration works on one snapshot of the matrix:
//!
//! 1. row and column sums are taken;
//! 2. every margin outside its [`Bandwidth`] gets a correction factor that
//!    moves it onto the violated edge (margins inside the band get `1.0`);
//! 3. the total gap (summed distance of corrected margins to their nearer
//!    edge) is compared with the stopping criteria;
//! 4. if fitting continues, columns are scaled by their factors, then rows.
//!
//! When a stopping criterion fires the matrix is returned *without* that
//! iteration's update.
//!
//! # Stopping criteria
//! - **Within gap** — total gap below [`BandwidthFitter::gap`].
//! - **Stalled** — the gap moved by less than [`BandwidthFitter::gap_improvement`]
//!   on [`BandwidthFitter::stall_limit`] iterations. Under
//!   [`StallPolicy::Cumulative`] (the default) those iterations need not be
//!   consecutive: the counter never resets.
//! - **Iteration cap** — [`BandwidthFitter::max_iterations`] loop bodies ran.
//!
//! # Invariants
//! - Iterations reported are in `1..=max_iterations`.
//! - A row or column with a zero sum is never rescaled and never adds to the gap.
//! - Non-negative input with non-negative bounds stays non-negative.

use alloc::vec;
use alloc::vec::Vec;

use tracing::{debug, trace};

use crate::bandwidth::{normalize, Axis, Bandwidth, MarginStatus};
use crate::error::{FitError, Result};
use crate::matrix::{Grid, Matrix};

/// Default total gap accepted as converged.
pub const DEFAULT_GAP: f64 = 1e-3;

/// Default minimum gap change counted as progress.
pub const DEFAULT_GAP_IMPROVEMENT: f64 = 1e-5;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 25;

/// Default number of non-improving iterations before giving up.
pub const DEFAULT_STALL_LIMIT: usize = 10;

/// How non-improving iterations are counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StallPolicy {
    /// Every non-improving iteration counts toward the limit, even after
    /// progress resumes.
    #[default]
    Cumulative,
    /// Only an unbroken run of non-improving iterations counts; progress
    /// resets the counter.
    Consecutive,
}

/// Why the fitting loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StopReason {
    /// Total gap dropped below the accepted gap.
    WithinGap,
    /// The stall counter reached the stall limit.
    Stalled,
    /// The iteration cap was reached.
    IterationCap,
}

/// Diagnostics of a fitting run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitReport {
    /// Loop bodies executed, including the one that stopped the loop.
    pub iterations: usize,
    /// Total gap at the last iteration.
    pub gap: f64,
    /// Last accepted gap minus the final gap. Zero when the cap was hit; may be
    /// negative or stale after a stall.
    pub gap_improvement: f64,
    /// Value of the stall counter at termination.
    pub stalls: usize,
    /// Which criterion ended the loop.
    pub stop: StopReason,
}

impl FitReport {
    /// Whether the final gap is below the accepted gap.
    pub fn converged(&self) -> bool {
        self.stop == StopReason::WithinGap
    }
}

/// Fitted matrix together with the bands it was fitted to and the run report.
#[derive(Clone, Debug, PartialEq)]
pub struct FitOutcome {
    /// Matrix as of the stopping iteration.
    pub matrix: Matrix,
    /// Run diagnostics.
    pub report: FitReport,
    rows: Vec<Bandwidth>,
    cols: Vec<Bandwidth>,
}

impl FitOutcome {
    /// `(matrix, iterations, gap, gap_improvement)`.
    pub fn into_parts(self) -> (Matrix, usize, f64, f64) {
        (self.matrix, self.report.iterations, self.report.gap, self.report.gap_improvement)
    }

    /// Normalized row bands.
    pub fn row_bands(&self) -> &[Bandwidth] {
        &self.rows
    }

    /// Normalized column bands.
    pub fn col_bands(&self) -> &[Bandwidth] {
        &self.cols
    }

    /// Position of each fitted row sum relative to its band.
    pub fn row_status(&self) -> Vec<MarginStatus> {
        status(&self.matrix.row_sums(), &self.rows)
    }

    /// Position of each fitted column sum relative to its band.
    pub fn col_status(&self) -> Vec<MarginStatus> {
        status(&self.matrix.col_sums(), &self.cols)
    }
}

fn status(sums: &[f64], bands: &[Bandwidth]) -> Vec<MarginStatus> {
    sums.iter().zip(bands).map(|(&s, b)| b.status(s)).collect()
}

/// Bandwidth-constrained IPF settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BandwidthFitter {
    /// Stop once the total gap is below this value (default: 1e-3).
    pub gap: f64,
    /// A gap change smaller than this counts as a stall (default: 1e-5).
    pub gap_improvement: f64,
    /// Hard cap on loop bodies (default: 25).
    pub max_iterations: usize,
    /// Stop once this many stalls are counted (default: 10).
    pub stall_limit: usize,
    /// How stalls are counted (default: cumulative).
    pub stall_policy: StallPolicy,
}

impl Default for BandwidthFitter {
    fn default() -> Self {
        Self {
            gap: DEFAULT_GAP,
            gap_improvement: DEFAULT_GAP_IMPROVEMENT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            stall_limit: DEFAULT_STALL_LIMIT,
            stall_policy: StallPolicy::Cumulative,
        }
    }
}

impl BandwidthFitter {
    /// Fitter with the given tolerances and iteration cap; stall handling at defaults.
    pub fn new(gap: f64, gap_improvement: f64, max_iterations: usize) -> Self {
        Self { gap, gap_improvement, max_iterations, ..Self::default() }
    }

    /// Replace the stall limit.
    pub fn with_stall_limit(mut self, stall_limit: usize) -> Self {
        self.stall_limit = stall_limit;
        self
    }

    /// Replace the stall counting policy.
    pub fn with_stall_policy(mut self, stall_policy: StallPolicy) -> Self {
        self.stall_policy = stall_policy;
        self
    }

    /// Reject settings under which the loop is meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(FitError::ZeroIterations);
        }
        if self.stall_limit == 0 {
            return Err(FitError::ZeroStallLimit);
        }
        for (name, value) in [("gap", self.gap), ("gap_improvement", self.gap_improvement)] {
            if value.is_nan() || value < 0.0 {
                return Err(FitError::InvalidTolerance { name, value });
            }
        }
        Ok(())
    }

    /// Fit `matrix` to raw lower/upper bound vectors.
    ///
    /// Bounds are paired elementwise into bands; each pair may be given in
    /// either order.
    pub fn fit(
        &self,
        mut matrix: Matrix,
        row_min: &[f64],
        row_max: &[f64],
        col_min: &[f64],
        col_max: &[f64],
    ) -> Result<FitOutcome> {
        let rows = normalize(row_min, row_max, Axis::Row)?;
        let cols = normalize(col_min, col_max, Axis::Column)?;
        let report = self.fit_in_place(&mut matrix, &rows, &cols)?;
        Ok(FitOutcome { matrix, report, rows, cols })
    }

    /// Fit any [`Grid`] in place to already-normalized bands.
    ///
    /// On return the grid holds the matrix as of the stopping iteration.
    pub fn fit_in_place<G: Grid + ?Sized>(
        &self,
        grid: &mut G,
        rows: &[Bandwidth],
        cols: &[Bandwidth],
    ) -> Result<FitReport> {
        self.validate()?;
        let (nrows, ncols) = grid.shape();
        if rows.len() != nrows {
            return Err(FitError::ShapeMismatch { axis: Axis::Row, len: rows.len(), expected: nrows });
        }
        if cols.len() != ncols {
            return Err(FitError::ShapeMismatch {
                axis: Axis::Column,
                len: cols.len(),
                expected: ncols,
            });
        }

        let mut row_sums = vec![0.0; nrows];
        let mut col_sums = vec![0.0; ncols];
        let mut fr = vec![1.0; nrows];
        let mut fc = vec![1.0; ncols];

        let mut previous_gap = 0.0_f64;
        let mut stalls = 0_usize;
        let mut iterations = 0_usize;
        let mut total_gap = 0.0_f64;
        let mut stop = StopReason::IterationCap;

        while iterations < self.max_iterations {
            iterations += 1;

            grid.row_sums_into(&mut row_sums);
            grid.col_sums_into(&mut col_sums);
            total_gap = corrections(&row_sums, rows, &mut fr) + corrections(&col_sums, cols, &mut fc);

            if (total_gap - previous_gap).abs() < self.gap_improvement {
                stalls += 1;
            } else if self.stall_policy == StallPolicy::Consecutive {
                stalls = 0;
            }
            trace!(iteration = iterations, gap = total_gap, stalls, "bandwidth fit iteration");

            if total_gap < self.gap {
                stop = StopReason::WithinGap;
                break;
            }
            if stalls >= self.stall_limit {
                stop = StopReason::Stalled;
                break;
            }
            previous_gap = total_gap;

            for i in 0..nrows {
                for (j, &f) in fc.iter().enumerate() {
                    grid.scale(i, j, f);
                }
            }
            for (i, &f) in fr.iter().enumerate() {
                for j in 0..ncols {
                    grid.scale(i, j, f);
                }
            }
        }

        let report = FitReport {
            iterations,
            gap: total_gap,
            gap_improvement: previous_gap - total_gap,
            stalls,
            stop,
        };
        debug!(
            iterations = report.iterations,
            gap = report.gap,
            stalls = report.stalls,
            stop = ?report.stop,
            "bandwidth fit finished"
        );
        Ok(report)
    }
}

/// Write each margin's correction factor into `factors` and return the summed
/// gap of the margins that need correcting.
fn corrections(sums: &[f64], bands: &[Bandwidth], factors: &mut [f64]) -> f64 {
    let mut gap = 0.0;
    for ((f, &s), band) in factors.iter_mut().zip(sums).zip(bands) {
        *f = band.correction(s);
        if *f != 1.0 {
            gap += band.distance(s);
        }
    }
    gap
}

/// One-shot fit with explicit tolerances.
///
/// Returns the fitted matrix, the number of iterations performed, the final
/// total gap and the gap improvement at termination. `iterations == 0` is
/// rejected with [`FitError::ZeroIterations`].
#[allow(clippy::too_many_arguments)]
pub fn fit(
    matrix: Matrix,
    row_min: &[f64],
    row_max: &[f64],
    col_min: &[f64],
    col_max: &[f64],
    gap: f64,
    gap_improvement: f64,
    iterations: usize,
) -> Result<(Matrix, usize, f64, f64)> {
    BandwidthFitter::new(gap, gap_improvement, iterations)
        .fit(matrix, row_min, row_max, col_min, col_max)
        .map(FitOutcome::into_parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn band(a: f64, b: f64) -> Bandwidth {
        Bandwidth::new(a, b)
    }

    #[test]
    fn already_inside_bands_stops_on_first_iteration() {
        let mut m = [[1.0, 2.0], [3.0, 4.0]];
        let original = m;
        let r = BandwidthFitter::default()
            .fit_in_place(&mut m, &[band(0.0, 10.0); 2], &[band(0.0, 10.0); 2])
            .unwrap();
        assert_eq!(r.iterations, 1);
        assert_eq!(r.gap, 0.0);
        assert_eq!(r.stop, StopReason::WithinGap);
        assert!(r.converged());
        assert_eq!(m, original);
    }

    #[test]
    fn fixed_rows_reached_in_one_update() {
        // Row-only constraint: one update lands exactly, second iteration stops.
        let mut m = [[1.0, 1.0], [1.0, 3.0]];
        let r = BandwidthFitter::default()
            .fit_in_place(
                &mut m,
                &[Bandwidth::fixed(4.0), Bandwidth::fixed(8.0)],
                &[band(0.0, 100.0); 2],
            )
            .unwrap();
        assert_eq!(r.iterations, 2);
        assert!(r.converged());
        assert_relative_eq!(m[0][0] + m[0][1], 4.0, epsilon = 1e-12);
        assert_relative_eq!(m[1][0] + m[1][1], 8.0, epsilon = 1e-12);
        assert_relative_eq!(m[1][1], 6.0, epsilon = 1e-12);
        assert_relative_eq!(r.gap_improvement, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn gap_counts_only_corrected_margins() {
        let mut fr = [0.0; 3];
        let bands = [band(5.0, 10.0), band(5.0, 10.0), band(5.0, 10.0)];
        let gap = corrections(&[7.0, 2.0, 14.0], &bands, &mut fr);
        assert_eq!(fr, [1.0, 2.5, 10.0 / 14.0]);
        assert_eq!(gap, 3.0 + 4.0);
    }

    #[test]
    fn zero_margins_contribute_no_gap() {
        let mut fr = [0.0; 2];
        let gap = corrections(&[0.0, 0.0], &[band(5.0, 10.0); 2], &mut fr);
        assert_eq!(fr, [1.0, 1.0]);
        assert_eq!(gap, 0.0);
    }

    #[test]
    fn oscillating_bands_hit_iteration_cap() {
        // Rows demand a total of 20, columns a total of 10: the matrix flips
        // between two states forever and the gap alternates 22, 70, 22, ...
        let mut m = [[1.0, 1.0], [1.0, 1.0]];
        let r = BandwidthFitter::new(1e-3, 1e-5, 5)
            .fit_in_place(&mut m, &[Bandwidth::fixed(10.0); 2], &[Bandwidth::fixed(5.0); 2])
            .unwrap();
        assert_eq!(r.stop, StopReason::IterationCap);
        assert_eq!(r.iterations, 5);
        assert_relative_eq!(r.gap, 22.0, epsilon = 1e-9);
        assert_eq!(r.gap_improvement, 0.0);
        assert_eq!(r.stalls, 0);
    }

    #[test]
    fn all_zero_matrix_with_zero_gap_stalls_out() {
        let mut m = [[0.0; 2]; 2];
        let r = BandwidthFitter::new(0.0, 1e-5, 25)
            .fit_in_place(&mut m, &[band(1.0, 2.0); 2], &[band(1.0, 2.0); 2])
            .unwrap();
        assert_eq!(r.stop, StopReason::Stalled);
        assert_eq!(r.iterations, DEFAULT_STALL_LIMIT);
        assert_eq!(r.stalls, DEFAULT_STALL_LIMIT);
        assert_eq!(m, [[0.0; 2]; 2]);
    }

    #[test]
    fn all_zero_matrix_reports_zero_gap() {
        // Zero margins never count as violations, so the gap is zero at once.
        let mut m = [[0.0; 2]; 2];
        let r = BandwidthFitter::default()
            .fit_in_place(&mut m, &[band(1.0, 2.0); 2], &[band(1.0, 2.0); 2])
            .unwrap();
        assert_eq!(r.iterations, 1);
        assert_eq!(r.stop, StopReason::WithinGap);
    }

    #[test]
    fn custom_stall_limit() {
        let mut m = [[0.0; 2]; 2];
        let r = BandwidthFitter::new(0.0, 1e-5, 25)
            .with_stall_limit(3)
            .fit_in_place(&mut m, &[band(1.0, 2.0); 2], &[band(1.0, 2.0); 2])
            .unwrap();
        assert_eq!(r.iterations, 3);
        assert_eq!(r.stop, StopReason::Stalled);
    }

    #[test]
    fn validate_rejects_bad_settings() {
        assert_eq!(BandwidthFitter::new(1e-3, 1e-5, 0).validate(), Err(FitError::ZeroIterations));
        assert_eq!(
            BandwidthFitter::default().with_stall_limit(0).validate(),
            Err(FitError::ZeroStallLimit)
        );
        assert!(matches!(
            BandwidthFitter::new(-1.0, 1e-5, 5).validate(),
            Err(FitError::InvalidTolerance { name: "gap", .. })
        ));
        assert!(matches!(
            BandwidthFitter::new(1e-3, f64::NAN, 5).validate(),
            Err(FitError::InvalidTolerance { name: "gap_improvement", .. })
        ));
        assert!(BandwidthFitter::default().validate().is_ok());
    }

    #[test]
    fn shape_mismatch_is_reported_before_iterating() {
        let mut m = [[1.0, 2.0], [3.0, 4.0]];
        let err = BandwidthFitter::default()
            .fit_in_place(&mut m, &[band(0.0, 1.0); 3], &[band(0.0, 1.0); 2])
            .unwrap_err();
        assert_eq!(err, FitError::ShapeMismatch { axis: Axis::Row, len: 3, expected: 2 });
        assert_eq!(m, [[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn column_guard_uses_column_sum() {
        // Square matrix whose column 1 is empty while row 1 is not: column 1
        // must keep a neutral factor instead of dividing by its zero sum.
        let mut m = [[2.0, 0.0], [2.0, 0.0]];
        let r = BandwidthFitter::default()
            .fit_in_place(&mut m, &[band(0.0, 10.0); 2], &[band(1.0, 2.0); 2])
            .unwrap();
        assert!(r.converged());
        assert!(m.iter().flatten().all(|x| x.is_finite()));
        assert_eq!(m[0][1], 0.0);
        assert_relative_eq!(m[0][0] + m[1][0], 2.0, epsilon = 1e-12);
    }
}
