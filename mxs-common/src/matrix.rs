//! Dense square matrices
//!
//! Row-major `f64` storage with seeded generation, an index-ordered checksum
//! and the textbook `i -> k -> j` multiplication kernel shared by the
//! sequential and concurrent paths.

use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Dense square matrix, element `(r, c)` stored at `r * size + c`
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    size: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero-filled `size x size` matrix
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// Generate a matrix of uniform values in `[0, 1)` from a seed
    ///
    /// Cells are filled single-threaded in ascending index order, so the same
    /// `(size, seed)` always produces bit-identical data.
    pub fn generate(size: usize, seed: i64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed as u64);
        let data = (0..size * size).map(|_| rng.gen::<f64>()).collect();
        Self { size, data }
    }

    /// Wrap existing row-major data
    pub fn from_vec(size: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != size * size {
            return Err(Error::InvalidConfiguration(format!(
                "matrix of size {} needs {} cells, got {}",
                size,
                size * size,
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the full row-major buffer
    ///
    /// Callers that hand out row blocks to concurrent workers split this slice
    /// with `split_at_mut`, which keeps the blocks disjoint.
    pub fn rows_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.size..(row + 1) * self.size]
    }

    /// Sum of all elements in ascending index order
    pub fn checksum(&self) -> f64 {
        let mut sum = 0.0;
        for v in &self.data {
            sum += v;
        }
        sum
    }
}

/// Check that both operands share one size
pub fn ensure_same_size(a: &Matrix, b: &Matrix) -> Result<()> {
    if a.size() != b.size() {
        return Err(Error::InvalidConfiguration(format!(
            "operand sizes differ: {} vs {}",
            a.size(),
            b.size()
        )));
    }
    Ok(())
}

/// Compute output rows `rows` of `a * b` into `out`
///
/// `out` holds exactly those rows (`rows.len() * size` cells, zero-filled by
/// the caller). For each `(i, k)` the scalar `a[i][k]` is broadcast across
/// row `k` of `b`; keeping this order fixed keeps every cell's floating-point
/// accumulation identical between callers.
pub fn multiply_rows_into(a: &Matrix, b: &Matrix, rows: Range<usize>, out: &mut [f64]) {
    let n = a.size();
    debug_assert_eq!(out.len(), rows.len() * n);

    for (local, i) in rows.enumerate() {
        let c_row = &mut out[local * n..(local + 1) * n];
        for k in 0..n {
            let a_ik = a.get(i, k);
            for (c, &b_kj) in c_row.iter_mut().zip(b.row(k)) {
                *c += a_ik * b_kj;
            }
        }
    }
}

/// Reference single-threaded multiply, used as the timing baseline
pub fn multiply_sequential(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    ensure_same_size(a, b)?;

    let n = a.size();
    let mut result = Matrix::zeros(n);
    multiply_rows_into(a, b, 0..n, result.rows_mut());
    Ok(result)
}
