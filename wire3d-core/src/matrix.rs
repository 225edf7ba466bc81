/// Dense row-major matrix engine used by every transform in the pipeline
use approx::{AbsDiffEq, RelativeEq};
use nalgebra::Matrix4;
use std::fmt;
use std::ops::{Add, Mul, Sub};

use crate::error::{GeometryError, Result};

/// A dense `rows x cols` matrix of `f64` stored row-major.
///
/// The backing store always holds exactly `rows * cols` values and both
/// dimensions are at least one. Checked accessors return
/// [`GeometryError::IndexRange`] instead of panicking.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero-filled matrix
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GeometryError::Construction(format!(
                "dimensions must be positive, got {rows}x{cols}"
            )));
        }
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        })
    }

    pub fn square(n: usize) -> Result<Self> {
        Self::new(n, n)
    }

    /// Create an `n x n` identity matrix
    pub fn identity_of(n: usize) -> Result<Self> {
        let mut m = Self::square(n)?;
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        Ok(m)
    }

    /// Create a column vector from a flat slice
    pub fn from_column(values: &[f64]) -> Result<Self> {
        let mut m = Self::new(values.len(), 1)?;
        m.data.copy_from_slice(values);
        Ok(m)
    }

    /// Create a matrix from a list of equally sized rows
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut m = Self::new(rows.len(), cols)?;
        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(GeometryError::Construction(format!(
                    "row {r} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            m.data[r * cols..(r + 1) * cols].copy_from_slice(row);
        }
        Ok(m)
    }

    /// Create a matrix whose columns are the given slices, e.g. one column per vertex
    pub fn from_columns<C: AsRef<[f64]>>(columns: &[C]) -> Result<Self> {
        Ok(Self::from_rows(columns)?.transpose())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Row-major view of the backing store
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(GeometryError::IndexRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.offset(row, col).map(|i| self.data[i])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let i = self.offset(row, col)?;
        self.data[i] = value;
        Ok(())
    }

    /// Copy out a single column
    pub fn column(&self, col: usize) -> Result<Vec<f64>> {
        self.offset(0, col)?;
        Ok((0..self.rows).map(|r| self.data[r * self.cols + col]).collect())
    }

    fn check_same_shape(&self, other: &Matrix, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(self.mismatch(other, op));
        }
        Ok(())
    }

    fn mismatch(&self, other: &Matrix, op: &'static str) -> GeometryError {
        GeometryError::DimensionMismatch {
            op,
            lhs_rows: self.rows,
            lhs_cols: self.cols,
            rhs_rows: other.rows,
            rhs_cols: other.cols,
        }
    }

    /// Apply `f` to every element, producing a new matrix of the same shape
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    fn zip_with(&self, other: &Matrix, op: &'static str, f: impl Fn(f64, f64) -> f64) -> Result<Matrix> {
        self.check_same_shape(other, op)?;
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Elementwise sum
    pub fn try_add(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "addition", |a, b| a + b)
    }

    /// Elementwise difference
    pub fn try_sub(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "subtraction", |a, b| a - b)
    }

    /// Matrix product `self * other`
    pub fn try_mul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(self.mismatch(other, "product"));
        }
        let mut out = Matrix {
            rows: self.rows,
            cols: other.cols,
            data: vec![0.0; self.rows * other.cols],
        };
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.data[i * self.cols + k] * other.data[k * other.cols + j];
                }
                out.data[i * other.cols + j] = sum;
            }
        }
        Ok(out)
    }

    /// Reset this matrix to the identity in place
    pub fn identity(&mut self) -> Result<()> {
        if !self.is_square() {
            return Err(GeometryError::Shape {
                op: "identity",
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.data.fill(0.0);
        for i in 0..self.rows {
            self.data[i * self.cols + i] = 1.0;
        }
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.data[r * self.cols + c]);
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    pub fn transpose_in_place(&mut self) {
        *self = self.transpose();
    }

    /// Grow the matrix to `new_rows x new_cols`.
    ///
    /// Cells in new rows take `fill[(row - old_rows) % fill.len()]`; new cells in
    /// existing rows take `fill[(col - old_cols) % fill.len()]`. An empty `fill`
    /// pads with zeros. Shrinking is rejected.
    pub fn resize(&mut self, new_rows: usize, new_cols: usize, fill: &[f64]) -> Result<()> {
        if new_rows < self.rows || new_cols < self.cols {
            return Err(GeometryError::Argument(format!(
                "resize cannot shrink {}x{} to {new_rows}x{new_cols}",
                self.rows, self.cols
            )));
        }
        let pick = |i: usize| if fill.is_empty() { 0.0 } else { fill[i % fill.len()] };

        let mut data = Vec::with_capacity(new_rows * new_cols);
        for r in 0..new_rows {
            for c in 0..new_cols {
                let value = if r >= self.rows {
                    pick(r - self.rows)
                } else if c >= self.cols {
                    pick(c - self.cols)
                } else {
                    self.data[r * self.cols + c]
                };
                data.push(value);
            }
        }
        self.rows = new_rows;
        self.cols = new_cols;
        self.data = data;
        Ok(())
    }

    /// Gauss-Jordan inverse. A pivot counts as zero only when it is exactly zero.
    pub fn inverse(&self) -> Result<Matrix> {
        self.gauss_jordan(0.0)
    }

    /// Gauss-Jordan inverse treating any pivot with `|p| <= epsilon` as zero
    pub fn inverse_with_tolerance(&self, epsilon: f64) -> Result<Matrix> {
        self.gauss_jordan(epsilon.abs())
    }

    fn gauss_jordan(&self, epsilon: f64) -> Result<Matrix> {
        if !self.is_square() {
            return Err(GeometryError::Shape {
                op: "inverse",
                rows: self.rows,
                cols: self.cols,
            });
        }
        let n = self.rows;
        let is_zero = |v: f64| v.abs() <= epsilon;
        let mut work = self.data.clone();
        let mut inv = Matrix::identity_of(n)?.data;

        for col in 0..n {
            if is_zero(work[col * n + col]) {
                let candidate = (col + 1..n).find(|&r| !is_zero(work[r * n + col]));
                let Some(swap) = candidate else {
                    return Err(GeometryError::SingularMatrix);
                };
                for k in 0..n {
                    work.swap(col * n + k, swap * n + k);
                    inv.swap(col * n + k, swap * n + k);
                }
            }

            let pivot = work[col * n + col];
            for k in 0..n {
                work[col * n + k] /= pivot;
                inv[col * n + k] /= pivot;
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = work[r * n + col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..n {
                    work[r * n + k] -= factor * work[col * n + k];
                    inv[r * n + k] -= factor * inv[col * n + k];
                }
            }
        }

        Ok(Matrix {
            rows: n,
            cols: n,
            data: inv,
        })
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let row = &self.data[r * self.cols..(r + 1) * self.cols];
            let cells: Vec<String> = row.iter().map(|v| format!("{v:>10.4}")).collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

// Scalar broadcasts. These cannot fail, so they are plain operators.

impl Add<f64> for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: f64) -> Matrix {
        self.map(|v| v + rhs)
    }
}

impl Add<&Matrix> for f64 {
    type Output = Matrix;

    fn add(self, rhs: &Matrix) -> Matrix {
        rhs + self
    }
}

impl Sub<f64> for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: f64) -> Matrix {
        self.map(|v| v - rhs)
    }
}

impl Sub<&Matrix> for f64 {
    type Output = Matrix;

    fn sub(self, rhs: &Matrix) -> Matrix {
        rhs.map(|v| self - v)
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f64) -> Matrix {
        self.map(|v| v * rhs)
    }
}

impl Mul<&Matrix> for f64 {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        rhs * self
    }
}

impl AbsDiffEq for Matrix {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl RelativeEq for Matrix {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}

impl From<&Matrix4<f64>> for Matrix {
    fn from(m: &Matrix4<f64>) -> Self {
        let mut data = Vec::with_capacity(16);
        for r in 0..4 {
            for c in 0..4 {
                data.push(m[(r, c)]);
            }
        }
        Matrix {
            rows: 4,
            cols: 4,
            data,
        }
    }
}

impl From<Matrix4<f64>> for Matrix {
    fn from(m: Matrix4<f64>) -> Self {
        Matrix::from(&m)
    }
}

impl TryFrom<&Matrix> for Matrix4<f64> {
    type Error = GeometryError;

    fn try_from(m: &Matrix) -> Result<Self> {
        if m.shape() != (4, 4) {
            return Err(GeometryError::Shape {
                op: "conversion to Matrix4",
                rows: m.rows,
                cols: m.cols,
            });
        }
        Ok(Matrix4::from_row_slice(&m.data))
    }
}
