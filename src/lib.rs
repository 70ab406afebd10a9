//! lcg-lattice - State recovery for linear congruential generators from truncated outputs.
//!
//! Observing only the high bits of consecutive LCG or Lehmer outputs is enough to
//! rebuild the hidden state: the outputs satisfy a modular linear relation, a reduced
//! lattice basis turns the missing low bits into a rounding problem, and every
//! candidate seed is confirmed by re-simulating the generator.
//!
//! ```no_run
//! use lcg_lattice::lcg::{truncate_all, MSVC};
//! use lcg_lattice::recover::{Attack, AttackConfig, SearchMode};
//! use num_bigint::BigInt;
//!
//! let params = MSVC.params();
//! let samples = truncate_all(&params.sequence(&BigInt::from(987654321), 8), 12);
//! let attack = Attack::new(params, &samples, AttackConfig::new(12)).unwrap();
//! let report = attack.run(SearchMode::First, None);
//! assert_eq!(report.seeds, vec![BigInt::from(987654321)]);
//! ```

pub mod error;
pub mod lattice;
pub mod lcg;
pub mod matrix;
pub mod output;
pub mod parse;
pub mod recover;
pub mod reduce;

pub use error::{BranchFailure, EngineError};
pub use lcg::GeneratorParams;
pub use recover::{reconstruct_state, Attack, AttackConfig};

/// Default progress bar style for CLI operations.
pub fn default_progress_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} branches ({per_sec})")
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
        .progress_chars("#>-")
}
