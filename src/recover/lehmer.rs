//! Direct state reconstruction for Lehmer generators.
//!
//! With `b = 0` the states themselves satisfy `x_i ≡ a^i x_0 (mod m)`, so
//! the lattice can be built over the samples directly and no carry branches
//! are needed.

use log::debug;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Signed;

use crate::error::EngineError;
use crate::lattice::LowerBitsSolver;
use crate::reduce::LatticeReducer;

use super::MIN_SAMPLES;

/// Rebuild every full state of a truncated Lehmer sequence.
///
/// Returns `Ok(None)` when the lattice solve fails or the rebuilt states do
/// not follow `x_{i+1} = a x_i mod m`.
pub fn reconstruct_lehmer_states(
    modulus: &BigInt,
    multiplier: &BigInt,
    samples: &[BigInt],
    reducer: &dyn LatticeReducer,
) -> Result<Option<Vec<BigInt>>, EngineError> {
    if samples.len() < MIN_SAMPLES {
        return Err(EngineError::InsufficientSamples {
            required: MIN_SAMPLES,
            got: samples.len(),
        });
    }
    for (index, value) in samples.iter().enumerate() {
        if value.is_negative() || value >= modulus {
            return Err(EngineError::SampleOutOfRange {
                index,
                value: value.clone(),
            });
        }
    }

    let solver = LowerBitsSolver::new(reducer, modulus, multiplier, samples.len())?;
    let zs = match solver.solve(samples) {
        Ok(zs) => zs,
        Err(failure) => {
            debug!("direct reconstruction failed: {}", failure);
            return Ok(None);
        }
    };

    let states: Vec<BigInt> = samples
        .iter()
        .zip(&zs)
        .map(|(y, z)| (y + z).mod_floor(modulus))
        .collect();

    let consistent = states
        .windows(2)
        .all(|w| (multiplier * &w[0]).mod_floor(modulus) == w[1]);
    if !consistent {
        debug!("direct reconstruction produced an inconsistent sequence");
        return Ok(None);
    }

    Ok(Some(states))
}
