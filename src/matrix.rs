//! Exact integer matrices.
//!
//! `IntMatrix` is the single matrix representation used by the engine and
//! by the lattice-reduction boundary. Rows are basis vectors.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::error::EngineError;

/// Column vector of exact integers.
pub type IntVector = Vec<BigInt>;

/// Dense integer matrix stored as row vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntMatrix {
    rows: Vec<IntVector>,
    cols: usize,
}

/// Result of solving `B · z = c` over the rationals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Every entry of `z` has denominator 1.
    Integral(IntVector),
    /// At least one entry of `z` is a proper fraction.
    NonIntegral,
}

impl IntMatrix {
    /// Build a matrix from row vectors. All rows must have the same length.
    pub fn new(rows: Vec<IntVector>) -> Result<Self, EngineError> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(EngineError::DimensionMismatch {
                expected: cols,
                got: bad.len(),
            });
        }
        Ok(Self { rows, cols })
    }

    /// Build a matrix from rows of anything convertible into `BigInt`.
    pub fn from_rows<T: Into<BigInt> + Clone>(rows: &[Vec<T>]) -> Result<Self, EngineError> {
        let rows = rows
            .iter()
            .map(|row| row.iter().cloned().map(Into::into).collect())
            .collect();
        Self::new(rows)
    }

    /// `n × n` zero matrix.
    pub fn zeros(n: usize) -> Self {
        Self {
            rows: vec![vec![BigInt::zero(); n]; n],
            cols: n,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows.len() == self.cols
    }

    pub fn row(&self, i: usize) -> &[BigInt] {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[IntVector] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<IntVector> {
        self.rows
    }

    pub fn set(&mut self, i: usize, j: usize, value: BigInt) {
        self.rows[i][j] = value;
    }

    pub fn get(&self, i: usize, j: usize) -> &BigInt {
        &self.rows[i][j]
    }

    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.rows.swap(i, j);
    }

    /// `row_i -= q * row_j`
    pub fn sub_row_multiple(&mut self, i: usize, j: usize, q: &BigInt) {
        if q.is_zero() || i == j {
            return;
        }
        let (target, source) = if i < j {
            let (lo, hi) = self.rows.split_at_mut(j);
            (&mut lo[i], &hi[0])
        } else {
            let (lo, hi) = self.rows.split_at_mut(i);
            (&mut hi[0], &lo[j])
        };
        for (t, s) in target.iter_mut().zip(source) {
            *t -= q * s;
        }
    }

    /// Inner product of rows `i` and `j`.
    pub fn row_dot(&self, i: usize, j: usize) -> BigInt {
        dot(&self.rows[i], &self.rows[j])
    }

    /// Squared Euclidean norm of row `i`.
    pub fn norm_squared(&self, i: usize) -> BigInt {
        self.row_dot(i, i)
    }

    /// Exact product `self · v`.
    pub fn mul_vec(&self, v: &[BigInt]) -> Result<IntVector, EngineError> {
        if v.len() != self.cols {
            return Err(EngineError::DimensionMismatch {
                expected: self.cols,
                got: v.len(),
            });
        }
        Ok(self.rows.iter().map(|row| dot(row, v)).collect())
    }

    /// Solve `self · z = rhs` exactly.
    ///
    /// Fraction-free (Bareiss) elimination keeps every intermediate value an
    /// integer; the back-substitution then reports `NonIntegral` at the first
    /// division that does not come out exact.
    pub fn solve(&self, rhs: &[BigInt]) -> Result<SolveOutcome, EngineError> {
        let n = self.rows.len();
        if !self.is_square() {
            return Err(EngineError::DimensionMismatch {
                expected: n,
                got: self.cols,
            });
        }
        if rhs.len() != n {
            return Err(EngineError::DimensionMismatch {
                expected: n,
                got: rhs.len(),
            });
        }
        if n == 0 {
            return Ok(SolveOutcome::Integral(Vec::new()));
        }

        let mut aug: Vec<IntVector> = self
            .rows
            .iter()
            .zip(rhs)
            .map(|(row, c)| {
                let mut r = row.clone();
                r.push(c.clone());
                r
            })
            .collect();

        let mut prev = BigInt::one();
        for k in 0..n {
            if aug[k][k].is_zero() {
                let pivot = (k + 1..n)
                    .find(|&r| !aug[r][k].is_zero())
                    .ok_or(EngineError::Singular)?;
                aug.swap(k, pivot);
            }
            for i in k + 1..n {
                for j in k + 1..=n {
                    let v = (&aug[k][k] * &aug[i][j] - &aug[i][k] * &aug[k][j]) / &prev;
                    aug[i][j] = v;
                }
                aug[i][k] = BigInt::zero();
            }
            prev = aug[k][k].clone();
        }

        let mut z = vec![BigInt::zero(); n];
        for i in (0..n).rev() {
            let mut s = aug[i][n].clone();
            for j in i + 1..n {
                s -= &aug[i][j] * &z[j];
            }
            let (q, r) = s.div_rem(&aug[i][i]);
            if !r.is_zero() {
                return Ok(SolveOutcome::NonIntegral);
            }
            z[i] = q;
        }

        Ok(SolveOutcome::Integral(z))
    }
}

/// Exact inner product of two equally long vectors.
pub fn dot(a: &[BigInt], b: &[BigInt]) -> BigInt {
    a.iter().zip(b).fold(BigInt::zero(), |acc, (x, y)| acc + x * y)
}
