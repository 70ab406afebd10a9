//! Candidate validation by re-simulation.

use num_bigint::BigInt;

use crate::lcg::{blank_lower_bits, GeneratorParams};

/// True if the generator started at `seed` reproduces every observed sample
/// once its states are blanked to `shift` bits.
///
/// The seed is the first observed state, so `samples[0]` is compared against
/// `seed` itself.
pub fn viable_state(params: &GeneratorParams, seed: &BigInt, samples: &[BigInt], shift: usize) -> bool {
    let Some((first, rest)) = samples.split_first() else {
        return true;
    };
    if blank_lower_bits(seed, shift) != *first {
        return false;
    }
    params
        .states(seed)
        .zip(rest)
        .all(|(state, sample)| blank_lower_bits(&state, shift) == *sample)
}
