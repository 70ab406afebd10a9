//! Lattice-basis reduction.
//!
//! The engine only talks to reduction through [`LatticeReducer`]. The bundled
//! [`IntegralLll`] is an all-integer LLL (Cohen, "A Course in Computational
//! Algebraic Number Theory", Alg. 2.6.7): Gram-Schmidt data is carried as the
//! sub-determinants `d_i` and the scaled coefficients `λ_ij = d_{j+1} μ_ij`,
//! so no rational or floating value ever appears.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::error::EngineError;
use crate::matrix::IntMatrix;

/// Contract: the output spans the same lattice as the input, rows are
/// reduced, and identical input always gives identical output.
pub trait LatticeReducer: Send + Sync {
    /// Human-readable name of this reducer.
    fn name(&self) -> &'static str;

    /// Reduce the row basis of `basis`.
    fn reduce(&self, basis: &IntMatrix) -> Result<IntMatrix, EngineError>;
}

/// Lovász parameter δ = `delta_num / delta_den`, which must lie in (1/4, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LllConfig {
    pub delta_num: u32,
    pub delta_den: u32,
}

impl Default for LllConfig {
    fn default() -> Self {
        Self {
            delta_num: 99,
            delta_den: 100,
        }
    }
}

impl LllConfig {
    /// δ = 3/4, the parameter from the original LLL paper.
    pub fn classic() -> Self {
        Self {
            delta_num: 3,
            delta_den: 4,
        }
    }
}

/// Counters from one reduction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LllStats {
    pub swaps: usize,
    pub size_reductions: usize,
}

/// Exact integral LLL.
#[derive(Debug, Clone, Default)]
pub struct IntegralLll {
    config: LllConfig,
}

impl IntegralLll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LllConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> LllConfig {
        self.config
    }

    /// Reduce and also return the run counters.
    pub fn reduce_with_stats(&self, basis: &IntMatrix) -> Result<(IntMatrix, LllStats), EngineError> {
        let mut state = LllState::new(basis.clone())?;
        state.run(self.config)?;
        Ok((state.basis, state.stats))
    }
}

impl LatticeReducer for IntegralLll {
    fn name(&self) -> &'static str {
        "integral-lll"
    }

    fn reduce(&self, basis: &IntMatrix) -> Result<IntMatrix, EngineError> {
        self.reduce_with_stats(basis).map(|(b, _)| b)
    }
}

struct LllState {
    basis: IntMatrix,
    /// `d[0] = 1`, `d[i + 1]` = Gram determinant of rows `0..=i`.
    d: Vec<BigInt>,
    lambda: Vec<Vec<BigInt>>,
    stats: LllStats,
}

impl LllState {
    fn new(basis: IntMatrix) -> Result<Self, EngineError> {
        let n = basis.num_rows();
        if n > 0 && basis.num_cols() == 0 {
            return Err(EngineError::Singular);
        }
        let mut d = vec![BigInt::zero(); n + 1];
        d[0] = BigInt::from(1);
        Ok(Self {
            basis,
            d,
            lambda: vec![vec![BigInt::zero(); n]; n],
            stats: LllStats::default(),
        })
    }

    fn run(&mut self, config: LllConfig) -> Result<(), EngineError> {
        let n = self.basis.num_rows();
        if n == 0 {
            return Ok(());
        }

        self.d[1] = self.basis.norm_squared(0);
        if self.d[1].is_zero() {
            return Err(EngineError::Singular);
        }
        if n == 1 {
            return Ok(());
        }

        let num = BigInt::from(config.delta_num);
        let den = BigInt::from(config.delta_den);
        let mut k = 1usize;
        let mut k_max = 0usize;

        while k < n {
            if k > k_max {
                k_max = k;
                self.incremental_gram_schmidt(k)?;
            }

            self.size_reduce(k, k - 1);

            let lhs = &den * &self.d[k + 1] * &self.d[k - 1];
            let lam = &self.lambda[k][k - 1];
            let rhs = &num * &self.d[k] * &self.d[k] - &den * lam * lam;

            if lhs < rhs {
                self.swap(k, k_max);
                k = (k - 1).max(1);
            } else {
                for l in (0..k - 1).rev() {
                    self.size_reduce(k, l);
                }
                k += 1;
            }
        }

        Ok(())
    }

    fn incremental_gram_schmidt(&mut self, k: usize) -> Result<(), EngineError> {
        for j in 0..=k {
            let mut u = self.basis.row_dot(k, j);
            for i in 0..j {
                u = (&self.d[i + 1] * &u - &self.lambda[k][i] * &self.lambda[j][i]) / &self.d[i];
            }
            if j < k {
                self.lambda[k][j] = u;
            } else {
                if u.is_zero() {
                    return Err(EngineError::Singular);
                }
                self.d[k + 1] = u;
            }
        }
        Ok(())
    }

    /// `b_k -= round(λ_kl / d_{l+1}) · b_l`
    fn size_reduce(&mut self, k: usize, l: usize) {
        let dl = &self.d[l + 1];
        let two_lambda: BigInt = &self.lambda[k][l] * 2;
        if two_lambda.abs() <= *dl {
            return;
        }

        let q = (&two_lambda + dl).div_floor(&(dl * 2));
        self.basis.sub_row_multiple(k, l, &q);
        self.lambda[k][l] -= &q * dl;
        for i in 0..l {
            let delta = &q * &self.lambda[l][i];
            self.lambda[k][i] -= delta;
        }
        self.stats.size_reductions += 1;
    }

    fn swap(&mut self, k: usize, k_max: usize) {
        self.basis.swap_rows(k, k - 1);
        {
            let (lo, hi) = self.lambda.split_at_mut(k);
            for j in 0..k - 1 {
                std::mem::swap(&mut lo[k - 1][j], &mut hi[0][j]);
            }
        }

        let lam = self.lambda[k][k - 1].clone();
        let b = (&self.d[k - 1] * &self.d[k + 1] + &lam * &lam) / &self.d[k];

        for i in k + 1..=k_max {
            let t = self.lambda[i][k].clone();
            let new_ik = (&self.d[k + 1] * &self.lambda[i][k - 1] - &lam * &t) / &self.d[k];
            let new_ik1 = (&b * &t + &lam * &new_ik) / &self.d[k + 1];
            self.lambda[i][k] = new_ik;
            self.lambda[i][k - 1] = new_ik1;
        }

        self.d[k] = b;
        self.stats.swaps += 1;
    }
}

/// Check size reduction (`|μ_ij| ≤ 1/2`) and the Lovász condition for `config`.
pub fn is_reduced(basis: &IntMatrix, config: LllConfig) -> bool {
    let n = basis.num_rows();
    if n <= 1 {
        return true;
    }

    let mut state = match LllState::new(basis.clone()) {
        Ok(s) => s,
        Err(_) => return false,
    };
    state.d[1] = basis.norm_squared(0);
    if state.d[1].is_zero() {
        return false;
    }
    for k in 1..n {
        if state.incremental_gram_schmidt(k).is_err() {
            return false;
        }
    }

    let num = BigInt::from(config.delta_num);
    let den = BigInt::from(config.delta_den);
    for k in 1..n {
        for j in 0..k {
            let two_lambda: BigInt = &state.lambda[k][j] * 2;
            if two_lambda.abs() > state.d[j + 1] {
                return false;
            }
        }
        let lam = &state.lambda[k][k - 1];
        let lhs = &den * &state.d[k + 1] * &state.d[k - 1];
        let rhs = &num * &state.d[k] * &state.d[k] - &den * lam * lam;
        if lhs < rhs {
            return false;
        }
    }

    true
}
