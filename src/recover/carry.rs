//! Carry-ambiguity enumeration.
//!
//! Dropping the low `shift` bits of two consecutive states loses whether a
//! borrow happened between them, so every truncated difference comes in two
//! versions. Branch `i` of the product is read as a bit mask: bit `p` set
//! means "pair `p` borrowed".

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;

/// Maximum number of consecutive pairs a branch mask can address.
pub const MAX_PAIRS: usize = 63;

/// `((y_{i+1} - y_i) mod m, (y_{i+1} - y_i - 2^shift) mod m)` for every pair.
pub fn carry_options(samples: &[BigInt], modulus: &BigInt, shift: usize) -> Vec<(BigInt, BigInt)> {
    let borrow = BigInt::one() << shift;
    samples
        .windows(2)
        .map(|w| {
            let diff = &w[1] - &w[0];
            let with_borrow = (&diff - &borrow).mod_floor(modulus);
            (diff.mod_floor(modulus), with_borrow)
        })
        .collect()
}

/// Cartesian product of the per-pair options, in mask order.
#[derive(Debug, Clone)]
pub struct CarryCombinations {
    options: Vec<(BigInt, BigInt)>,
    next: u64,
}

impl CarryCombinations {
    /// `options.len()` must not exceed [`MAX_PAIRS`].
    pub fn new(options: Vec<(BigInt, BigInt)>) -> Self {
        debug_assert!(options.len() <= MAX_PAIRS);
        Self { options, next: 0 }
    }

    pub fn from_samples(samples: &[BigInt], modulus: &BigInt, shift: usize) -> Self {
        Self::new(carry_options(samples, modulus, shift))
    }

    /// Number of pairs (and lattice dimension).
    pub fn pairs(&self) -> usize {
        self.options.len()
    }

    /// Total number of branches, `2^pairs`.
    pub fn total(&self) -> u64 {
        1u64 << self.options.len()
    }

    /// Differences selected by branch `index`.
    pub fn branch(&self, index: u64) -> Vec<BigInt> {
        self.options
            .iter()
            .enumerate()
            .map(|(p, (plain, borrowed))| {
                if (index >> p) & 1 == 1 {
                    borrowed.clone()
                } else {
                    plain.clone()
                }
            })
            .collect()
    }
}

impl Iterator for CarryCombinations {
    type Item = (u64, Vec<BigInt>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some((index, self.branch(index)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total() - self.next;
        match usize::try_from(remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}
