//! Python FFI bindings via PyO3.
//!
//! Exposes bandwidth fitting to Python with nested lists as the matrix type.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from bandfit_core import ipf_minmax, BandwidthFitter
//!
//! m = [[0.00, 0.99, 1.00], [0.99, 0.00, 0.96], [1.00, 0.96, 0.00]]
//! matrix, iterations, gap, improvement = ipf_minmax(
//!     m, [50, 100, 50], [50, 100, 50], [0, 0, 0], [150, 60, 175],
//!     gap=0.001, gap_improvement=0.00001, iterations=25)
//!
//! fitter = BandwidthFitter(gap=0.001, stall_policy="consecutive")
//! result = fitter.fit(m, [50, 100, 50], [50, 100, 50], [0, 0, 0], [150, 60, 175])
//! print(result.stop, result.row_sums)
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::FitError;
use crate::fitter::{
    BandwidthFitter as RustFitter, StallPolicy, StopReason, DEFAULT_GAP, DEFAULT_GAP_IMPROVEMENT,
    DEFAULT_MAX_ITERATIONS, DEFAULT_STALL_LIMIT,
};
use crate::matrix::Matrix;

fn to_py_err(e: FitError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_policy(name: &str) -> PyResult<StallPolicy> {
    match name {
        "cumulative" => Ok(StallPolicy::Cumulative),
        "consecutive" => Ok(StallPolicy::Consecutive),
        other => Err(PyValueError::new_err(format!(
            "stall_policy must be 'cumulative' or 'consecutive', got '{other}'"
        ))),
    }
}

fn stop_name(stop: StopReason) -> &'static str {
    match stop {
        StopReason::WithinGap => "within_gap",
        StopReason::Stalled => "stalled",
        StopReason::IterationCap => "iteration_cap",
    }
}

// ── Module-level function ─────────────────────────────────────────────────────

/// Fit a matrix to bandwidth margins.
///
/// Args:
///     matrix:          list of equal-length rows of weights
///     row_min/row_max: row bounds, either order per entry
///     col_min/col_max: column bounds, either order per entry
///     gap:             accepted total gap
///     gap_improvement: smallest gap change counted as progress
///     iterations:      iteration cap (>= 1)
///
/// Returns:
///     (matrix, iterations_used, final_gap, gap_improvement_at_stop)
///
/// Raises:
///     ValueError on mismatched shapes or invalid settings.
#[pyfunction]
#[pyo3(signature = (
    matrix, row_min, row_max, col_min, col_max,
    gap=DEFAULT_GAP, gap_improvement=DEFAULT_GAP_IMPROVEMENT, iterations=DEFAULT_MAX_ITERATIONS
))]
#[allow(clippy::too_many_arguments)]
pub fn ipf_minmax(
    matrix: Vec<Vec<f64>>,
    row_min: Vec<f64>,
    row_max: Vec<f64>,
    col_min: Vec<f64>,
    col_max: Vec<f64>,
    gap: f64,
    gap_improvement: f64,
    iterations: usize,
) -> PyResult<(Vec<Vec<f64>>, usize, f64, f64)> {
    let m = Matrix::try_from(matrix).map_err(to_py_err)?;
    let (m, it, g, dg) = crate::fitter::fit(
        m, &row_min, &row_max, &col_min, &col_max, gap, gap_improvement, iterations,
    )
    .map_err(to_py_err)?;
    Ok((m.into(), it, g, dg))
}

// ── FitResult ─────────────────────────────────────────────────────────────────

/// Outcome of `BandwidthFitter.fit`.
#[pyclass(name = "FitResult", get_all)]
pub struct PyFitResult {
    /// Fitted matrix as nested lists.
    pub matrix: Vec<Vec<f64>>,
    /// Row sums of the fitted matrix.
    pub row_sums: Vec<f64>,
    /// Column sums of the fitted matrix.
    pub col_sums: Vec<f64>,
    /// Iterations performed.
    pub iterations: usize,
    /// Final total gap.
    pub gap: f64,
    /// Gap improvement at termination.
    pub gap_improvement: f64,
    /// Stall counter at termination.
    pub stalls: usize,
    /// 'within_gap', 'stalled' or 'iteration_cap'.
    pub stop: String,
}

#[pymethods]
impl PyFitResult {
    /// True if the final gap is below the accepted gap.
    #[getter]
    pub fn converged(&self) -> bool {
        self.stop == stop_name(StopReason::WithinGap)
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!(
            "FitResult(iterations={}, gap={:.6e}, stop='{}')",
            self.iterations, self.gap, self.stop
        )
    }
}

// ── BandwidthFitter ───────────────────────────────────────────────────────────

/// Reusable fitter settings.
#[pyclass(name = "BandwidthFitter")]
#[derive(Clone)]
pub struct PyBandwidthFitter {
    inner: RustFitter,
}

#[pymethods]
impl PyBandwidthFitter {
    /// Create a fitter.
    ///
    /// Args:
    ///     gap:             accepted total gap (default 1e-3)
    ///     gap_improvement: smallest gap change counted as progress (default 1e-5)
    ///     max_iterations:  iteration cap (default 25)
    ///     stall_limit:     stalls tolerated before stopping (default 10)
    ///     stall_policy:    'cumulative' (default) or 'consecutive'
    #[new]
    #[pyo3(signature = (
        gap=DEFAULT_GAP, gap_improvement=DEFAULT_GAP_IMPROVEMENT,
        max_iterations=DEFAULT_MAX_ITERATIONS, stall_limit=DEFAULT_STALL_LIMIT,
        stall_policy="cumulative"
    ))]
    pub fn new(
        gap: f64,
        gap_improvement: f64,
        max_iterations: usize,
        stall_limit: usize,
        stall_policy: &str,
    ) -> PyResult<Self> {
        let inner = RustFitter::new(gap, gap_improvement, max_iterations)
            .with_stall_limit(stall_limit)
            .with_stall_policy(parse_policy(stall_policy)?);
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Fit `matrix` to the given bounds.
    pub fn fit(
        &self,
        matrix: Vec<Vec<f64>>,
        row_min: Vec<f64>,
        row_max: Vec<f64>,
        col_min: Vec<f64>,
        col_max: Vec<f64>,
    ) -> PyResult<PyFitResult> {
        let m = Matrix::try_from(matrix).map_err(to_py_err)?;
        let outcome = self
            .inner
            .fit(m, &row_min, &row_max, &col_min, &col_max)
            .map_err(to_py_err)?;
        let report = outcome.report;
        Ok(PyFitResult {
            row_sums: outcome.matrix.row_sums(),
            col_sums: outcome.matrix.col_sums(),
            matrix: outcome.matrix.into(),
            iterations: report.iterations,
            gap: report.gap,
            gap_improvement: report.gap_improvement,
            stalls: report.stalls,
            stop: stop_name(report.stop).to_string(),
        })
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        let policy = match self.inner.stall_policy {
            StallPolicy::Cumulative => "cumulative",
            StallPolicy::Consecutive => "consecutive",
        };
        format!(
            "BandwidthFitter(gap={}, gap_improvement={}, max_iterations={}, stall_limit={}, stall_policy='{}')",
            self.inner.gap,
            self.inner.gap_improvement,
            self.inner.max_iterations,
            self.inner.stall_limit,
            policy,
        )
    }
}

// ── Module entry point ────────────────────────────────────────────────────────

/// Bandwidth-constrained iterative proportional fitting.
#[pymodule]
pub fn bandfit_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ipf_minmax, m)?)?;
    m.add_class::<PyBandwidthFitter>()?;
    m.add_class::<PyFitResult>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
