//! Seed retrieval from the first consecutive difference.
//!
//! `x_1 - x_0 ≡ (a - 1) x_0 + b (mod m)`, so a recovered difference `z`
//! pins the seed down to the solutions of `(a - 1) s ≡ z - b (mod m)`.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::BranchFailure;
use crate::lcg::GeneratorParams;

/// Default cap on `gcd(a - 1, m)` candidates per branch.
pub const DEFAULT_MAX_CANDIDATES: u64 = 1 << 16;

/// Inverse of `a` modulo `m`, if it exists.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    if m.is_one() {
        return Some(BigInt::zero());
    }
    let egcd = a.mod_floor(m).extended_gcd(m);
    if !egcd.gcd.is_one() {
        return None;
    }
    Some(egcd.x.mod_floor(m))
}

/// All seeds `s` in `[0, m)` with `(a - 1) s + b ≡ z (mod m)`.
///
/// There are `gcd(a - 1, m)` of them when any exist.
pub fn retrieve_states(
    params: &GeneratorParams,
    z: &BigInt,
    max_candidates: u64,
) -> Result<Vec<BigInt>, BranchFailure> {
    let m = params.modulus();
    let a1 = params.multiplier() - BigInt::one();
    let rhs = (z - params.increment()).mod_floor(m);

    let d = a1.gcd(m);
    if !rhs.mod_floor(&d).is_zero() {
        return Err(BranchFailure::NonInvertibleMultiplier);
    }

    let count = match d.to_u64() {
        Some(c) if c <= max_candidates => c,
        _ => return Err(BranchFailure::TooManyCandidates),
    };

    let reduced_m = m / &d;
    let inv = mod_inverse(&(&a1 / &d), &reduced_m).ok_or(BranchFailure::NonInvertibleMultiplier)?;
    let base = ((&rhs / &d) * inv).mod_floor(&reduced_m);

    Ok((0..count)
        .map(|k| (&base + &reduced_m * BigInt::from(k)).mod_floor(m))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcg::{GLIBC, MSVC};

    fn big(v: i64) -> BigInt {
        BigInt::from(v)
    }

    #[test]
    fn test_mod_inverse() {
        assert_eq!(mod_inverse(&big(3), &big(7)), Some(big(5)));
        assert_eq!(mod_inverse(&big(-3), &big(7)), Some(big(2)));
        assert_eq!(mod_inverse(&big(4), &big(8)), None);
        assert_eq!(mod_inverse(&big(5), &big(1)), Some(big(0)));
    }

    #[test]
    fn test_single_candidate_for_prime_modulus() {
        let params = GeneratorParams::new(4294967291i64, 598176085, 12345).unwrap();
        let seed = big(1234567);
        let z = (params.next(&seed) - &seed).mod_floor(params.modulus());

        let states = retrieve_states(&params, &z, DEFAULT_MAX_CANDIDATES).unwrap();
        assert_eq!(states, vec![seed]);
    }

    #[test]
    fn test_multiple_candidates_when_gcd_exceeds_one() {
        // gcd(214013 - 1, 2^32) = 4
        let params = MSVC.params();
        let seed = big(987654321);
        let z = (params.next(&seed) - &seed).mod_floor(params.modulus());
        assert_eq!(z, big(1653538815));

        let states = retrieve_states(&params, &z, DEFAULT_MAX_CANDIDATES).unwrap();
        assert_eq!(
            states,
            vec![big(987654321), big(2061396145), big(3135137969), big(4208879793)]
        );
        for s in &states {
            assert_eq!((params.next(s) - s).mod_floor(params.modulus()), z);
        }
    }

    #[test]
    fn test_not_divisible_fails_branch() {
        let params = MSVC.params();
        let err = retrieve_states(&params, &big(1653538816), DEFAULT_MAX_CANDIDATES).unwrap_err();
        assert_eq!(err, BranchFailure::NonInvertibleMultiplier);
    }

    #[test]
    fn test_candidate_cap() {
        // a = 1 makes gcd(a - 1, m) = m
        let params = GeneratorParams::new(1u64 << 20, 1, 7).unwrap();
        let err = retrieve_states(&params, &big(7), DEFAULT_MAX_CANDIDATES).unwrap_err();
        assert_eq!(err, BranchFailure::TooManyCandidates);
    }

    #[test]
    fn test_glibc_even_gcd() {
        // gcd(1103515244, 2^31) = 4
        let params = GLIBC.params();
        let seed = big(42424242);
        let z = (params.next(&seed) - &seed).mod_floor(params.modulus());
        let states = retrieve_states(&params, &z, DEFAULT_MAX_CANDIDATES).unwrap();
        assert_eq!(states.len(), 4);
        assert!(states.contains(&seed));
    }
}
