//! Lattice construction and the reduced-basis lower-bits solver.
//!
//! For consecutive Lehmer states `x_i = a^i x_0 mod m` the rows
//!
//! ```text
//! [ m          0  0 ...  0 ]
//! [ a^1 mod m -1  0 ...  0 ]
//! [ a^2 mod m  0 -1 ...  0 ]
//! ...
//! [ a^k mod m  0  0 ... -1 ]
//! ```
//!
//! satisfy `L · x ≡ 0 (mod m)`. After reduction the rows are short, so for
//! `x = y + z` with small unknown `z` the products `B · x = m · k` can be
//! rounded out of `B · y` alone.

use log::debug;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;

use crate::error::{BranchFailure, EngineError};
use crate::matrix::{dot, IntMatrix, IntVector, SolveOutcome};
use crate::reduce::LatticeReducer;

/// Build the `size × size` lattice for modulus `m` and multiplier `a`.
pub fn construct_lattice(m: &BigInt, a: &BigInt, size: usize) -> IntMatrix {
    let mut lattice = IntMatrix::zeros(size);
    if size == 0 {
        return lattice;
    }

    lattice.set(0, 0, m.clone());
    let mut power = BigInt::one();
    for i in 1..size {
        power = (&power * a).mod_floor(m);
        lattice.set(i, 0, power.clone());
        lattice.set(i, i, -BigInt::one());
    }
    lattice
}

/// Nearest integer to `v / m` for `m > 0`; ties round toward +∞.
pub fn round_div(v: &BigInt, m: &BigInt) -> BigInt {
    let two_v: BigInt = v * 2;
    (two_v + m).div_floor(&(m * 2))
}

/// Recovers the hidden low parts of a window of states.
///
/// The lattice depends only on `(m, a, size)`, so the reduction is done once
/// in [`LowerBitsSolver::new`] and the solver is then shared read-only by
/// every carry branch and worker thread.
#[derive(Debug, Clone)]
pub struct LowerBitsSolver {
    modulus: BigInt,
    reduced: IntMatrix,
}

impl LowerBitsSolver {
    pub fn new(
        reducer: &dyn LatticeReducer,
        modulus: &BigInt,
        multiplier: &BigInt,
        size: usize,
    ) -> Result<Self, EngineError> {
        let lattice = construct_lattice(modulus, multiplier, size);
        Self::from_lattice(reducer, &lattice, modulus)
    }

    /// Reduce an arbitrary lattice satisfying `L · x ≡ 0 (mod m)`.
    pub fn from_lattice(
        reducer: &dyn LatticeReducer,
        lattice: &IntMatrix,
        modulus: &BigInt,
    ) -> Result<Self, EngineError> {
        let reduced = reducer.reduce(lattice)?;
        if reduced.num_rows() != lattice.num_rows() || reduced.num_cols() != lattice.num_cols() {
            return Err(EngineError::DimensionMismatch {
                expected: lattice.num_rows(),
                got: reduced.num_rows(),
            });
        }
        debug!(
            "reduced {}x{} lattice with {}",
            lattice.num_rows(),
            lattice.num_cols(),
            reducer.name()
        );
        Ok(Self {
            modulus: modulus.clone(),
            reduced,
        })
    }

    pub fn size(&self) -> usize {
        self.reduced.num_rows()
    }

    pub fn reduced_basis(&self) -> &IntMatrix {
        &self.reduced
    }

    /// Given the known high parts `ys`, return `zs` with `B · (ys + zs) ≡ 0`.
    ///
    /// The entries of `zs` are returned as solved, without reduction mod `m`.
    /// `ys` must hold exactly [`size`](Self::size) entries.
    pub fn solve(&self, ys: &[BigInt]) -> Result<IntVector, BranchFailure> {
        debug_assert_eq!(ys.len(), self.size(), "solver input has the wrong dimension");
        let m = &self.modulus;
        let bys: IntVector = self.reduced.rows().iter().map(|row| dot(row, ys)).collect();

        let bzs: IntVector = bys
            .iter()
            .map(|v| m * round_div(v, m) - v)
            .collect();

        // The reduced basis is non-singular and square, so `solve` only fails
        // on a dimension mismatch, ruled out above.
        match self.reduced.solve(&bzs) {
            Ok(SolveOutcome::Integral(zs)) => Ok(zs),
            Ok(SolveOutcome::NonIntegral) | Err(_) => Err(BranchFailure::NonIntegralSolution),
        }
    }
}

/// One-shot convenience: reduce `lattice` and solve for the lower parts of `ys`.
pub fn reconstruct_lower_bits(
    reducer: &dyn LatticeReducer,
    lattice: &IntMatrix,
    modulus: &BigInt,
    ys: &[BigInt],
) -> Result<Result<IntVector, BranchFailure>, EngineError> {
    if ys.len() != lattice.num_cols() {
        return Err(EngineError::DimensionMismatch {
            expected: lattice.num_cols(),
            got: ys.len(),
        });
    }
    let solver = LowerBitsSolver::from_lattice(reducer, lattice, modulus)?;
    Ok(solver.solve(ys))
}
