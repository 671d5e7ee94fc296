/*
 * bandfit-core: iterative proportional fitting with bandwidth margins.
 *
 * This source code is licensed under the MIT License.
 */

//! Dense weight matrices and the [`Grid`] abstraction the fitter runs on.
//!
//! [`Matrix`] is a heap-backed, row-major `R × C` matrix of `f64`. Callers that
//! want to avoid allocating a matrix can fit a fixed-size `[[f64; C]; R]`
//! directly, since it implements [`Grid`] too.

use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::error::{FitError, Result};

/// Read and rescale access to a dense `rows × cols` grid of weights.
pub trait Grid {
    /// `(rows, cols)`.
    fn shape(&self) -> (usize, usize);

    /// Entry at `(row, col)`.
    fn get(&self, row: usize, col: usize) -> f64;

    /// Multiply the entry at `(row, col)` by `factor`.
    fn scale(&mut self, row: usize, col: usize, factor: f64);

    /// Sum of each row, written into `out` (length `rows`).
    fn row_sums_into(&self, out: &mut [f64]) {
        let (_, cols) = self.shape();
        for (i, s) in out.iter_mut().enumerate() {
            *s = (0..cols).map(|j| self.get(i, j)).sum();
        }
    }

    /// Sum of each column, written into `out` (length `cols`).
    fn col_sums_into(&self, out: &mut [f64]) {
        let (rows, _) = self.shape();
        for (j, s) in out.iter_mut().enumerate() {
            *s = (0..rows).map(|i| self.get(i, j)).sum();
        }
    }
}

impl<const R: usize, const C: usize> Grid for [[f64; C]; R] {
    fn shape(&self) -> (usize, usize) {
        (R, C)
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        self[row][col]
    }

    #[inline]
    fn scale(&mut self, row: usize, col: usize, factor: f64) {
        self[row][col] *= factor;
    }
}

/// Row-major dense matrix.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(into = "Vec<Vec<f64>>", try_from = "Vec<Vec<f64>>")
)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// `rows × cols` matrix of zeros. Both dimensions must be non-zero.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        Self::from_vec(rows, cols, alloc::vec![0.0; rows * cols])
    }

    /// Build from row-major storage. Both dimensions must be non-zero.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(FitError::EmptyMatrix);
        }
        if data.len() != rows * cols {
            return Err(FitError::DataLength { len: data.len(), rows, cols });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from a slice of rows. Rows must be non-empty and of equal length.
    pub fn from_rows<T: AsRef<[f64]>>(rows: &[T]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        if cols == 0 {
            return Err(FitError::EmptyMatrix);
        }
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(FitError::RaggedRow { row: i, len: row.len(), expected: cols });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { rows: rows.len(), cols, data })
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Row-major storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Borrow row `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Row margins.
    pub fn row_sums(&self) -> Vec<f64> {
        let mut out = alloc::vec![0.0; self.rows];
        self.row_sums_into(&mut out);
        out
    }

    /// Column margins.
    pub fn col_sums(&self) -> Vec<f64> {
        let mut out = alloc::vec![0.0; self.cols];
        self.col_sums_into(&mut out);
        out
    }

    /// Sum of every entry.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Multiply column `j` by `factors[j]` for every column.
    pub fn scale_cols(&mut self, factors: &[f64]) {
        debug_assert_eq!(factors.len(), self.cols);
        for row in self.data.chunks_exact_mut(self.cols.max(1)) {
            for (x, f) in row.iter_mut().zip(factors) {
                *x *= f;
            }
        }
    }

    /// Multiply row `i` by `factors[i]` for every row.
    pub fn scale_rows(&mut self, factors: &[f64]) {
        debug_assert_eq!(factors.len(), self.rows);
        for (row, f) in self.data.chunks_exact_mut(self.cols.max(1)).zip(factors) {
            for x in row.iter_mut() {
                *x *= f;
            }
        }
    }

    /// Largest absolute entrywise difference to `other`, or `None` if the
    /// shapes differ.
    pub fn max_abs_diff(&self, other: &Matrix) -> Option<f64> {
        if self.shape() != other.shape() {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0_f64, f64::max),
        )
    }
}

impl Grid for Matrix {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    fn scale(&mut self, row: usize, col: usize, factor: f64) {
        self.data[row * self.cols + col] *= factor;
    }

    fn row_sums_into(&self, out: &mut [f64]) {
        for (s, row) in out.iter_mut().zip(self.rows()) {
            *s = row.iter().sum();
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(j < self.cols, "column {j} out of range for {} columns", self.cols);
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        assert!(j < self.cols, "column {j} out of range for {} columns", self.cols);
        &mut self.data[i * self.cols + j]
    }
}

impl<const R: usize, const C: usize> From<[[f64; C]; R]> for Matrix {
    fn from(rows: [[f64; C]; R]) -> Self {
        const { assert!(R > 0 && C > 0, "matrix must have at least one row and one column") };
        Self { rows: R, cols: C, data: rows.iter().flatten().copied().collect() }
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = FitError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(m: Matrix) -> Self {
        m.rows().map(<[f64]>::to_vec).collect()
    }
}
