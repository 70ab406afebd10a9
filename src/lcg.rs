//! Linear Congruential Generator (LCG) model.
//!
//! LCGs follow `next = (a * prev + b) mod m`; with `b = 0` this is a Lehmer
//! (multiplicative) generator. Parameters are arbitrary precision so the same
//! code covers 31-bit libc generators and cryptographically sized moduli.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::error::EngineError;

/// Validated, immutable generator parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorParams {
    modulus: BigInt,
    multiplier: BigInt,
    increment: BigInt,
}

impl GeneratorParams {
    pub fn builder() -> GeneratorParamsBuilder {
        GeneratorParamsBuilder::default()
    }

    /// Shorthand for `builder().modulus(m).multiplier(a).increment(b).build()`.
    pub fn new(
        modulus: impl Into<BigInt>,
        multiplier: impl Into<BigInt>,
        increment: impl Into<BigInt>,
    ) -> Result<Self, EngineError> {
        Self::builder()
            .modulus(modulus)
            .multiplier(multiplier)
            .increment(increment)
            .build()
    }

    /// Lehmer generator (`b = 0`).
    pub fn lehmer(modulus: impl Into<BigInt>, multiplier: impl Into<BigInt>) -> Result<Self, EngineError> {
        Self::builder().modulus(modulus).multiplier(multiplier).build()
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    pub fn multiplier(&self) -> &BigInt {
        &self.multiplier
    }

    pub fn increment(&self) -> &BigInt {
        &self.increment
    }

    pub fn is_lehmer(&self) -> bool {
        self.increment.is_zero()
    }

    /// Bit length of the modulus.
    pub fn bits(&self) -> u64 {
        self.modulus.bits()
    }

    /// Compute next state.
    #[inline]
    pub fn next(&self, state: &BigInt) -> BigInt {
        (&self.multiplier * state + &self.increment).mod_floor(&self.modulus)
    }

    /// Infinite iterator over the successors of `seed` (not including it).
    pub fn states(&self, seed: &BigInt) -> LcgStates<'_> {
        LcgStates {
            params: self,
            state: seed.mod_floor(&self.modulus),
        }
    }

    /// `n` consecutive states starting with `seed` itself.
    pub fn sequence(&self, seed: &BigInt, n: usize) -> Vec<BigInt> {
        if n == 0 {
            return Vec::new();
        }
        let seed = seed.mod_floor(&self.modulus);
        let mut out = Vec::with_capacity(n);
        out.push(seed.clone());
        out.extend(self.states(&seed).take(n - 1));
        out
    }
}

/// Builder for [`GeneratorParams`]; the increment defaults to zero.
#[derive(Debug, Clone, Default)]
pub struct GeneratorParamsBuilder {
    modulus: Option<BigInt>,
    multiplier: Option<BigInt>,
    increment: Option<BigInt>,
}

impl GeneratorParamsBuilder {
    pub fn modulus(mut self, m: impl Into<BigInt>) -> Self {
        self.modulus = Some(m.into());
        self
    }

    pub fn multiplier(mut self, a: impl Into<BigInt>) -> Self {
        self.multiplier = Some(a.into());
        self
    }

    pub fn increment(mut self, b: impl Into<BigInt>) -> Self {
        self.increment = Some(b.into());
        self
    }

    pub fn build(self) -> Result<GeneratorParams, EngineError> {
        let modulus = self.modulus.unwrap_or_else(BigInt::zero);
        if modulus <= BigInt::one() {
            return Err(EngineError::InvalidModulus(modulus));
        }

        let multiplier = self.multiplier.unwrap_or_else(BigInt::zero);
        if !multiplier.is_positive() || multiplier >= modulus {
            return Err(EngineError::InvalidMultiplier(multiplier));
        }

        let increment = self.increment.unwrap_or_else(BigInt::zero);
        if increment.is_negative() || increment >= modulus {
            return Err(EngineError::InvalidIncrement(increment));
        }

        Ok(GeneratorParams {
            modulus,
            multiplier,
            increment,
        })
    }
}

/// Iterator over successive generator states.
#[derive(Debug, Clone)]
pub struct LcgStates<'a> {
    params: &'a GeneratorParams,
    state: BigInt,
}

impl Iterator for LcgStates<'_> {
    type Item = BigInt;

    fn next(&mut self) -> Option<BigInt> {
        self.state = self.params.next(&self.state);
        Some(self.state.clone())
    }
}

/// Zero the low `shift` bits of `v`.
pub fn blank_lower_bits(v: &BigInt, shift: usize) -> BigInt {
    (v >> shift) << shift
}

/// Half the bit length of `v`, used when no explicit shift is given.
pub fn default_shift(v: &BigInt) -> usize {
    (v.bits() / 2) as usize
}

/// Truncate every state to its high bits.
pub fn truncate_all(states: &[BigInt], shift: usize) -> Vec<BigInt> {
    states.iter().map(|x| blank_lower_bits(x, shift)).collect()
}

/// Parameters for a well-known LCG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcgVariant {
    /// Human-readable name
    pub name: &'static str,
    /// Multiplier (a)
    pub a: u64,
    /// Increment (c)
    pub c: u64,
    /// Modulus (m)
    pub m: u64,
}

impl LcgVariant {
    /// Parse variant from string name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "glibc" => Some(GLIBC),
            "minstd" => Some(MINSTD),
            "msvc" => Some(MSVC),
            "borland" => Some(BORLAND),
            "drand48" | "java" => Some(DRAND48),
            _ => None,
        }
    }

    pub fn params(&self) -> GeneratorParams {
        GeneratorParams {
            modulus: BigInt::from(self.m),
            multiplier: BigInt::from(self.a),
            increment: BigInt::from(self.c),
        }
    }
}

/// glibc rand() - most common Unix LCG
/// next = (1103515245 * prev + 12345) mod 2^31
pub const GLIBC: LcgVariant = LcgVariant {
    name: "glibc",
    a: 1103515245,
    c: 12345,
    m: 1 << 31,
};

/// MINSTD (Lehmer RNG) - minimal standard RNG
/// next = (16807 * prev) mod (2^31 - 1)
pub const MINSTD: LcgVariant = LcgVariant {
    name: "minstd",
    a: 16807,
    c: 0,
    m: (1 << 31) - 1,
};

/// Microsoft Visual C++ LCG
/// next = (214013 * prev + 2531011) mod 2^32
pub const MSVC: LcgVariant = LcgVariant {
    name: "msvc",
    a: 214013,
    c: 2531011,
    m: 1 << 32,
};

/// Borland C/C++ LCG
/// next = (22695477 * prev + 1) mod 2^32
pub const BORLAND: LcgVariant = LcgVariant {
    name: "borland",
    a: 22695477,
    c: 1,
    m: 1 << 32,
};

/// POSIX drand48 / java.util.Random
/// next = (0x5DEECE66D * prev + 0xB) mod 2^48
pub const DRAND48: LcgVariant = LcgVariant {
    name: "drand48",
    a: 0x5DEECE66D,
    c: 0xB,
    m: 1 << 48,
};

/// All available LCG variants.
pub const ALL_VARIANTS: [LcgVariant; 5] = [GLIBC, MINSTD, MSVC, BORLAND, DRAND48];

#[cfg(test)]
mod tests {
    use super::*;

    fn big(v: u64) -> BigInt {
        BigInt::from(v)
    }

    #[test]
    fn test_glibc_sequence() {
        // glibc rand() with seed=1 produces known sequence
        let params = GLIBC.params();
        let states: Vec<BigInt> = params.states(&big(1)).take(3).collect();
        assert_eq!(states, vec![big(1103527590), big(377401575), big(662824084)]);
    }

    #[test]
    fn test_minstd_sequence() {
        let params = MINSTD.params();
        assert!(params.is_lehmer());
        let states: Vec<BigInt> = params.states(&big(1)).take(2).collect();
        assert_eq!(states, vec![big(16807), big(282475249)]);
    }

    #[test]
    fn test_msvc_sequence() {
        let params = MSVC.params();
        assert_eq!(params.next(&big(1)), big(2745024));
    }

    #[test]
    fn test_borland_sequence() {
        let params = BORLAND.params();
        assert_eq!(params.next(&big(1)), big(22695478));
    }

    #[test]
    fn test_sequence_starts_with_seed() {
        let params = GLIBC.params();
        let seq = params.sequence(&big(1), 4);
        assert_eq!(seq.len(), 4);
        assert_eq!(seq[0], big(1));
        assert_eq!(seq[1], big(1103527590));
        assert!(params.sequence(&big(1), 0).is_empty());
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!(LcgVariant::from_str("glibc"), Some(GLIBC));
        assert_eq!(LcgVariant::from_str("GLIBC"), Some(GLIBC));
        assert_eq!(LcgVariant::from_str("minstd"), Some(MINSTD));
        assert_eq!(LcgVariant::from_str("msvc"), Some(MSVC));
        assert_eq!(LcgVariant::from_str("borland"), Some(BORLAND));
        assert_eq!(LcgVariant::from_str("java"), Some(DRAND48));
        assert_eq!(LcgVariant::from_str("unknown"), None);
    }

    #[test]
    fn test_presets_are_valid_params() {
        for variant in ALL_VARIANTS {
            let p = variant.params();
            let rebuilt = GeneratorParams::new(p.modulus().clone(), p.multiplier().clone(), p.increment().clone());
            assert_eq!(rebuilt.unwrap(), p, "{}", variant.name);
        }
    }

    #[test]
    fn test_builder_defaults_to_lehmer() {
        let params = GeneratorParams::builder().modulus(97).multiplier(5).build().unwrap();
        assert!(params.is_lehmer());
        assert_eq!(params.next(&big(3)), big(15));
    }

    #[test]
    fn test_builder_rejects_bad_modulus() {
        let err = GeneratorParams::builder().modulus(1).multiplier(1).build().unwrap_err();
        assert_eq!(err, EngineError::InvalidModulus(big(1)));

        let err = GeneratorParams::builder().multiplier(3).build().unwrap_err();
        assert!(matches!(err, EngineError::InvalidModulus(_)));
    }

    #[test]
    fn test_builder_rejects_bad_multiplier() {
        let err = GeneratorParams::lehmer(97, 0).unwrap_err();
        assert_eq!(err, EngineError::InvalidMultiplier(big(0)));

        let err = GeneratorParams::lehmer(97, 97).unwrap_err();
        assert_eq!(err, EngineError::InvalidMultiplier(big(97)));

        let err = GeneratorParams::lehmer(97, -3).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMultiplier(_)));
    }

    #[test]
    fn test_builder_rejects_bad_increment() {
        let err = GeneratorParams::new(97, 5, 97).unwrap_err();
        assert_eq!(err, EngineError::InvalidIncrement(big(97)));

        let err = GeneratorParams::new(97, 5, -1).unwrap_err();
        assert!(matches!(err, EngineError::InvalidIncrement(_)));
    }

    #[test]
    fn test_blank_lower_bits() {
        assert_eq!(blank_lower_bits(&big(1477951715), 16), big(1477902336));
        assert_eq!(blank_lower_bits(&big(3597964208), 16), big(3597926400));
        assert_eq!(blank_lower_bits(&big(0xff), 0), big(0xff));
        assert_eq!(blank_lower_bits(&big(0xff), 8), big(0));
    }

    #[test]
    fn test_default_shift_is_half_bit_length() {
        assert_eq!(default_shift(&big(0xffff)), 8);
        assert_eq!(default_shift(&big(4294967291)), 16);
    }

    #[test]
    fn test_truncate_all() {
        let xs = vec![big(1477951715), big(3597964208), big(2802631510), big(3169049466)];
        let ys = truncate_all(&xs, 16);
        assert_eq!(ys, vec![big(1477902336), big(3597926400), big(2802581504), big(3168993280)]);
    }
}
