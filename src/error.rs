//! Error types for the recovery engine.
//!
//! Two layers: [`EngineError`] rejects malformed input before any lattice
//! work starts, while [`BranchFailure`] marks a single carry hypothesis as
//! dead so the enumeration can move on to the next one.

use num_bigint::BigInt;

/// Errors that stop an attack before (or instead of) running it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("modulus must be greater than 1, got {0}")]
    InvalidModulus(BigInt),

    #[error("multiplier must satisfy 0 < a < m, got {0}")]
    InvalidMultiplier(BigInt),

    #[error("increment must satisfy 0 <= b < m, got {0}")]
    InvalidIncrement(BigInt),

    #[error("sample sequence is empty")]
    EmptySamples,

    #[error("sample {index} ({value}) is outside [0, m)")]
    SampleOutOfRange { index: usize, value: BigInt },

    #[error("lattice window of {0} samples exceeds the supported maximum of 64")]
    WindowTooLarge(usize),

    #[error("need at least {required} samples, got {got}")]
    InsufficientSamples { required: usize, got: usize },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("matrix is singular")]
    Singular,
}

/// Why a single carry hypothesis produced no candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchFailure {
    /// The reduced-basis solve gave a non-integral vector.
    NonIntegralSolution,
    /// `(z - b) mod m` is not divisible by `gcd(a - 1, m)`.
    NonInvertibleMultiplier,
    /// `gcd(a - 1, m)` exceeds the configured candidate cap.
    TooManyCandidates,
}

impl BranchFailure {
    /// Short name for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchFailure::NonIntegralSolution => "non_integral",
            BranchFailure::NonInvertibleMultiplier => "non_invertible",
            BranchFailure::TooManyCandidates => "too_many_candidates",
        }
    }
}

impl std::fmt::Display for BranchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchFailure::NonIntegralSolution => write!(f, "lattice solution is not integral"),
            BranchFailure::NonInvertibleMultiplier => {
                write!(f, "difference is not divisible by gcd(a - 1, m)")
            }
            BranchFailure::TooManyCandidates => write!(f, "gcd(a - 1, m) exceeds candidate cap"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_messages() {
        let err = EngineError::InvalidModulus(BigInt::from(1));
        assert_eq!(err.to_string(), "modulus must be greater than 1, got 1");

        let err = EngineError::SampleOutOfRange { index: 2, value: BigInt::from(-5) };
        assert!(err.to_string().contains("sample 2 (-5)"));
    }

    #[test]
    fn test_branch_failure_names() {
        assert_eq!(BranchFailure::NonIntegralSolution.as_str(), "non_integral");
        assert_eq!(BranchFailure::NonInvertibleMultiplier.as_str(), "non_invertible");
        assert_eq!(BranchFailure::TooManyCandidates.as_str(), "too_many_candidates");
    }
}
