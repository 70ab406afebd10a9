//! Seed recovery from truncated LCG outputs.
//!
//! An [`Attack`] is set up once per sample sequence: inputs are checked, the
//! lattice over the first-difference window is reduced, and the per-pair
//! carry options are fixed. Branches are then evaluated either lazily through
//! [`Attack::seeds`] or in parallel through [`Attack::run`].
//!
//! Pipeline per branch:
//!
//! ```text
//! carry choice -> lower-bits solve -> first difference -> seed candidates -> validation
//! ```

mod carry;
mod lehmer;
mod retrieve;
mod search;
mod validate;

pub use carry::{carry_options, CarryCombinations, MAX_PAIRS};
pub use lehmer::reconstruct_lehmer_states;
pub use retrieve::{mod_inverse, retrieve_states, DEFAULT_MAX_CANDIDATES};
pub use search::{RecoveryReport, RecoveryStatus, SearchMode};
pub use validate::viable_state;

use std::borrow::Cow;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use log::{debug, warn};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Signed;

use crate::error::{BranchFailure, EngineError};
use crate::lattice::LowerBitsSolver;
use crate::lcg::{truncate_all, GeneratorParams};
use crate::reduce::{IntegralLll, LatticeReducer, LllConfig};

/// Fewest samples that give the lattice at least two differences.
pub const MIN_SAMPLES: usize = 3;

/// Largest lattice window, one more than [`MAX_PAIRS`].
pub const MAX_WINDOW: usize = MAX_PAIRS + 1;

/// Lattice window used when none is configured (`2^9` carry branches).
pub const DEFAULT_WINDOW: usize = 10;

/// Attack tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackConfig {
    /// Number of unknown low bits per sample.
    pub shift: usize,
    /// Leading samples used to build the lattice; `None` uses up to
    /// [`DEFAULT_WINDOW`]. Validation always checks every sample.
    pub window: Option<usize>,
    /// Branches whose `gcd(a - 1, m)` exceeds this are dropped.
    pub max_candidates: u64,
    pub lll: LllConfig,
}

impl AttackConfig {
    pub fn new(shift: usize) -> Self {
        Self {
            shift,
            window: None,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            lll: LllConfig::default(),
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: u64) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn with_lll(mut self, lll: LllConfig) -> Self {
        self.lll = lll;
        self
    }
}

#[derive(Debug)]
struct AttackPlan {
    solver: LowerBitsSolver,
    combos: CarryCombinations,
}

/// Result of evaluating one carry hypothesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BranchOutcome {
    Failed(BranchFailure),
    Candidates { viable: Vec<BigInt>, rejected: u64 },
}

/// A prepared lattice attack on one sample sequence.
#[derive(Debug, Clone)]
pub struct Attack {
    params: GeneratorParams,
    samples: Vec<BigInt>,
    config: AttackConfig,
    /// `None` when the input is too short or too truncated to attempt.
    plan: Option<Arc<AttackPlan>>,
}

impl Attack {
    /// Prepare an attack using the bundled [`IntegralLll`] reducer.
    pub fn new(params: GeneratorParams, samples: &[BigInt], config: AttackConfig) -> Result<Self, EngineError> {
        let reducer = IntegralLll::with_config(config.lll);
        Self::with_reducer(params, samples, config, &reducer)
    }

    /// Prepare an attack with a caller-supplied reducer.
    pub fn with_reducer(
        params: GeneratorParams,
        samples: &[BigInt],
        config: AttackConfig,
        reducer: &dyn LatticeReducer,
    ) -> Result<Self, EngineError> {
        if samples.is_empty() {
            return Err(EngineError::EmptySamples);
        }
        for (index, value) in samples.iter().enumerate() {
            if value.is_negative() || value >= params.modulus() {
                return Err(EngineError::SampleOutOfRange {
                    index,
                    value: value.clone(),
                });
            }
        }

        let window = match config.window {
            Some(w) if w > MAX_WINDOW => return Err(EngineError::WindowTooLarge(w)),
            Some(w) => w.min(samples.len()),
            None => DEFAULT_WINDOW.min(samples.len()),
        };

        let samples = truncate_all(samples, config.shift);

        let plan = if window < MIN_SAMPLES {
            warn!(
                "only {} samples in the lattice window, at least {} are needed; no seeds will be produced",
                window, MIN_SAMPLES
            );
            None
        } else if config.shift as u64 >= params.bits() {
            warn!(
                "shift {} leaves no known bits of a {}-bit modulus; no seeds will be produced",
                config.shift,
                params.bits()
            );
            None
        } else {
            let solver = LowerBitsSolver::new(reducer, params.modulus(), params.multiplier(), window - 1)?;
            let combos = CarryCombinations::from_samples(&samples[..window], params.modulus(), config.shift);
            debug!(
                "prepared attack: {} samples, window {}, shift {}, {} branches",
                samples.len(),
                window,
                config.shift,
                combos.total()
            );
            Some(Arc::new(AttackPlan { solver, combos }))
        };

        Ok(Self {
            params,
            samples,
            config,
            plan,
        })
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// Samples as used by the attack, blanked to `shift` bits.
    pub fn samples(&self) -> &[BigInt] {
        &self.samples
    }

    pub fn config(&self) -> &AttackConfig {
        &self.config
    }

    /// Whether the input is large enough to attempt at all.
    pub fn is_determined(&self) -> bool {
        self.plan.is_some()
    }

    /// Number of carry branches, zero for under-determined input.
    pub fn branches(&self) -> u64 {
        self.plan.as_ref().map_or(0, |p| p.combos.total())
    }

    /// Lazily enumerate validated seeds in branch order, without duplicates.
    pub fn seeds(&self) -> Seeds<'_> {
        Seeds::new(Cow::Borrowed(self))
    }

    pub fn into_seeds(self) -> Seeds<'static> {
        Seeds::new(Cow::Owned(self))
    }

    pub(crate) fn evaluate_branch(&self, index: u64) -> BranchOutcome {
        let Some(plan) = self.plan.as_deref() else {
            return BranchOutcome::Candidates {
                viable: Vec::new(),
                rejected: 0,
            };
        };
        let m = self.params.modulus();

        let deltas = plan.combos.branch(index);
        let zs = match plan.solver.solve(&deltas) {
            Ok(zs) => zs,
            Err(failure) => return BranchOutcome::Failed(failure),
        };
        let first_difference = (&deltas[0] + &zs[0]).mod_floor(m);

        let candidates = match retrieve_states(&self.params, &first_difference, self.config.max_candidates) {
            Ok(c) => c,
            Err(failure) => return BranchOutcome::Failed(failure),
        };

        let (viable, rejected): (Vec<BigInt>, Vec<BigInt>) = candidates
            .into_iter()
            .partition(|s| viable_state(&self.params, s, &self.samples, self.config.shift));

        BranchOutcome::Candidates {
            viable,
            rejected: rejected.len() as u64,
        }
    }
}

/// Lazy, finite sequence of validated seeds.
///
/// Re-running the same attack yields the same sequence.
#[derive(Debug)]
pub struct Seeds<'a> {
    attack: Cow<'a, Attack>,
    next_branch: u64,
    pending: VecDeque<BigInt>,
    seen: HashSet<BigInt>,
}

impl<'a> Seeds<'a> {
    fn new(attack: Cow<'a, Attack>) -> Self {
        Self {
            attack,
            next_branch: 0,
            pending: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Branches evaluated so far.
    pub fn branches_tried(&self) -> u64 {
        self.next_branch
    }
}

impl Iterator for Seeds<'_> {
    type Item = BigInt;

    fn next(&mut self) -> Option<BigInt> {
        loop {
            if let Some(seed) = self.pending.pop_front() {
                return Some(seed);
            }
            if self.next_branch >= self.attack.branches() {
                return None;
            }

            let index = self.next_branch;
            self.next_branch += 1;

            match self.attack.evaluate_branch(index) {
                BranchOutcome::Failed(failure) => {
                    debug!("branch {:#b}: {}", index, failure);
                }
                BranchOutcome::Candidates { viable, .. } => {
                    for seed in viable {
                        if self.seen.insert(seed.clone()) {
                            self.pending.push_back(seed);
                        }
                    }
                }
            }
        }
    }
}

/// Recover every seed consistent with `samples` under `s' = (a s + b) mod m`.
///
/// Parameters and samples are checked up front; running out of branches is
/// not an error and simply ends the sequence.
pub fn reconstruct_state(
    m: impl Into<BigInt>,
    a: impl Into<BigInt>,
    b: impl Into<BigInt>,
    samples: &[BigInt],
    shift: usize,
) -> Result<Seeds<'static>, EngineError> {
    let params = GeneratorParams::new(m, a, b)?;
    let attack = Attack::new(params, samples, AttackConfig::new(shift))?;
    Ok(attack.into_seeds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcg::{GLIBC, MINSTD, MSVC};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn big(v: i64) -> BigInt {
        BigInt::from(v)
    }

    fn bigs(v: &[i64]) -> Vec<BigInt> {
        v.iter().map(|&x| BigInt::from(x)).collect()
    }

    fn observe(params: &GeneratorParams, seed: &BigInt, n: usize, shift: usize) -> Vec<BigInt> {
        truncate_all(&params.sequence(seed, n), shift)
    }

    #[test]
    fn test_known_lehmer_sequence() {
        let ys = bigs(&[1477902336, 3597926400, 2802581504, 3168993280]);
        let seeds: Vec<BigInt> = reconstruct_state(4294967291i64, 598176085, 0, &ys, 16)
            .unwrap()
            .collect();
        assert_eq!(seeds, vec![big(1477951715)]);
    }

    #[test]
    fn test_affine_generator() {
        let params = GeneratorParams::new(4294967291i64, 598176085, 12345).unwrap();
        let seed = big(1234567);
        for (n, shift) in [(4, 8), (5, 10), (6, 12), (4, 16), (6, 16)] {
            let ys = observe(&params, &seed, n, shift);
            let attack = Attack::new(params.clone(), &ys, AttackConfig::new(shift)).unwrap();
            let seeds: Vec<BigInt> = attack.seeds().collect();
            assert!(seeds.contains(&seed), "n={} shift={}", n, shift);
        }
    }

    #[test]
    fn test_affine_and_lehmer_agree() {
        let seed = big(1234567);
        let lehmer = GeneratorParams::lehmer(4294967291i64, 598176085).unwrap();
        let affine = GeneratorParams::new(4294967291i64, 598176085, 12345).unwrap();

        for params in [lehmer, affine] {
            let ys = observe(&params, &seed, 5, 10);
            let first = Attack::new(params, &ys, AttackConfig::new(10)).unwrap().seeds().next();
            assert_eq!(first, Some(seed.clone()));
        }
    }

    #[test]
    fn test_power_of_two_moduli() {
        let cases = [
            (MSVC, 987654321i64, 6, 8),
            (MSVC, 987654321, 8, 12),
            (GLIBC, 42424242, 6, 4),
            (GLIBC, 42424242, 8, 8),
            (MINSTD, 42424242, 8, 12),
        ];
        for (variant, seed, n, shift) in cases {
            let params = variant.params();
            let seed = big(seed);
            let ys = observe(&params, &seed, n, shift);
            let seeds: Vec<BigInt> = Attack::new(params, &ys, AttackConfig::new(shift))
                .unwrap()
                .seeds()
                .collect();
            assert!(seeds.contains(&seed), "{} n={} shift={}", variant.name, n, shift);
        }
    }

    #[test]
    fn test_multiple_candidates_filtered_by_validation() {
        // gcd(a - 1, m) = 4 for MSVC, only the true seed reproduces the samples
        let params = MSVC.params();
        let ys = bigs(&[987654144, 2641192960, 1908220928, 1455930368, 1072336896, 1093287936]);
        let seeds: Vec<BigInt> = Attack::new(params, &ys, AttackConfig::new(8))
            .unwrap()
            .seeds()
            .collect();
        assert_eq!(seeds, vec![big(987654321)]);
    }

    #[test]
    fn test_deterministic_order() {
        let params = GLIBC.params();
        let ys = observe(&params, &big(42424242), 6, 8);
        let attack = Attack::new(params, &ys, AttackConfig::new(8)).unwrap();

        let first: Vec<BigInt> = attack.seeds().collect();
        let second: Vec<BigInt> = attack.seeds().collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_seeds_are_unique_and_viable() {
        let params = GLIBC.params();
        let ys = observe(&params, &big(42424242), 6, 8);
        let attack = Attack::new(params.clone(), &ys, AttackConfig::new(8)).unwrap();

        let seeds: Vec<BigInt> = attack.seeds().collect();
        let unique: HashSet<&BigInt> = seeds.iter().collect();
        assert_eq!(unique.len(), seeds.len());
        for s in &seeds {
            assert!(viable_state(&params, s, &ys, 8));
        }
    }

    #[test]
    fn test_too_few_samples_yield_nothing() {
        let params = GeneratorParams::lehmer(4294967291i64, 598176085).unwrap();
        let ys = observe(&params, &big(1477951715), 2, 16);
        let attack = Attack::new(params, &ys, AttackConfig::new(16)).unwrap();
        assert!(!attack.is_determined());
        assert_eq!(attack.branches(), 0);
        assert_eq!(attack.seeds().count(), 0);
    }

    #[test]
    fn test_shift_past_modulus_yields_nothing() {
        let params = GeneratorParams::lehmer(4294967291i64, 598176085).unwrap();
        let ys = observe(&params, &big(1477951715), 4, 32);
        assert!(ys.iter().all(|y| *y == big(0)));
        let seeds: Vec<BigInt> = reconstruct_state(4294967291i64, 598176085, 0, &ys, 32)
            .unwrap()
            .collect();
        assert!(seeds.is_empty());
    }

    #[test]
    fn test_heavy_truncation_gives_no_false_positives() {
        let params = GeneratorParams::lehmer(4294967291i64, 598176085).unwrap();
        let ys = observe(&params, &big(1477951715), 3, 28);
        let attack = Attack::new(params.clone(), &ys, AttackConfig::new(28)).unwrap();
        for s in attack.seeds() {
            assert!(viable_state(&params, &s, &ys, 28));
        }
    }

    #[test]
    fn test_window_limits_lattice_but_not_validation() {
        let params = MSVC.params();
        let seed = big(987654321);
        let ys = observe(&params, &seed, 10, 8);
        let attack = Attack::new(params, &ys, AttackConfig::new(8).with_window(6)).unwrap();
        assert_eq!(attack.branches(), 32);
        assert_eq!(attack.seeds().collect::<Vec<_>>(), vec![seed]);
    }

    #[test]
    fn test_long_sequence_uses_default_window() {
        let params = GeneratorParams::lehmer(4294967291i64, 598176085).unwrap();
        let ys = observe(&params, &big(1477951715), 65, 8);

        let attack = Attack::new(params, &ys, AttackConfig::new(8)).unwrap();
        assert_eq!(attack.branches(), 1 << (DEFAULT_WINDOW - 1));

        let first = reconstruct_state(4294967291i64, 598176085, 0, &ys, 8)
            .unwrap()
            .next();
        assert_eq!(first, Some(big(1477951715)));
    }

    #[test]
    fn test_eager_validation() {
        let params = MSVC.params();
        assert_eq!(
            Attack::new(params.clone(), &[], AttackConfig::new(8)).unwrap_err(),
            EngineError::EmptySamples
        );

        let err = Attack::new(params.clone(), &bigs(&[1, -2, 3]), AttackConfig::new(8)).unwrap_err();
        assert_eq!(err, EngineError::SampleOutOfRange { index: 1, value: big(-2) });

        let err = Attack::new(params.clone(), &bigs(&[1, 2, 1i64 << 32]), AttackConfig::new(8)).unwrap_err();
        assert!(matches!(err, EngineError::SampleOutOfRange { index: 2, .. }));

        let long = observe(&params, &big(1), 70, 8);
        let err = Attack::new(params.clone(), &long, AttackConfig::new(8).with_window(65)).unwrap_err();
        assert_eq!(err, EngineError::WindowTooLarge(65));
        assert!(Attack::new(params.clone(), &long, AttackConfig::new(8).with_window(8)).is_ok());
        assert!(Attack::new(params, &long, AttackConfig::new(8)).is_ok());

        assert!(matches!(
            reconstruct_state(1, 1, 0, &bigs(&[0, 0, 0]), 0),
            Err(EngineError::InvalidModulus(_))
        ));
    }

    #[test]
    fn test_difficulty_is_monotonic_in_shift() {
        let m = BigInt::from(u64::MAX - 58);
        let params = GeneratorParams::lehmer(m.clone(), 6364136223846793005u64).unwrap();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let seeds: Vec<BigInt> = (0..8)
            .map(|_| BigInt::from(rng.gen::<u64>()) % &m)
            .collect();

        let successes: Vec<usize> = [8usize, 32, 56]
            .iter()
            .map(|&shift| {
                seeds
                    .iter()
                    .filter(|seed| {
                        let ys = observe(&params, seed, 4, shift);
                        Attack::new(params.clone(), &ys, AttackConfig::new(shift))
                            .unwrap()
                            .seeds()
                            .any(|s| &s == *seed)
                    })
                    .count()
            })
            .collect();

        assert_eq!(successes[0], seeds.len());
        assert!(successes.windows(2).all(|w| w[0] >= w[1]), "{:?}", successes);
    }

    #[test]
    fn test_128_bit_modulus() {
        use std::str::FromStr;

        let m = BigInt::from_str("340282366920938463463374607431768211507").unwrap();
        let a = BigInt::from_str("18446744073709551629").unwrap();
        let params = GeneratorParams::lehmer(m, a).unwrap();
        let x0 = BigInt::from_str("338770000802117538137360555712826011270").unwrap();

        let ys = observe(&params, &x0, 6, 64);
        let seeds: Vec<BigInt> = Attack::new(params, &ys, AttackConfig::new(64))
            .unwrap()
            .seeds()
            .collect();
        assert_eq!(seeds, vec![x0]);
    }

    #[test]
    fn test_1024_bit_affine_generator() {
        let m: BigInt = (BigInt::from(1) << 1024) - 105;
        let a: BigInt = (BigInt::from(1) << 512) + 12345;
        let params = GeneratorParams::new(m.clone(), a, 987654321).unwrap();
        let seed = BigInt::from(3).modpow(&BigInt::from(600), &m);

        let ys = observe(&params, &seed, 6, 80);
        let seeds: Vec<BigInt> = Attack::new(params, &ys, AttackConfig::new(80))
            .unwrap()
            .seeds()
            .collect();
        assert_eq!(seeds, vec![seed]);
    }

    #[test]
    fn test_round_trip_random_parameters() {
        let mut rng = StdRng::seed_from_u64(42);
        // 2^61 - 1
        let m = BigInt::from((1u64 << 61) - 1);
        for _ in 0..6 {
            let a = BigInt::from(rng.gen_range(2u64..(1u64 << 61) - 1));
            let b = BigInt::from(rng.gen_range(0u64..(1u64 << 61) - 1));
            let seed = BigInt::from(rng.gen_range(0u64..(1u64 << 61) - 1));
            let params = GeneratorParams::new(m.clone(), a, b).unwrap();

            // shift <= bits / (2n)
            let ys = observe(&params, &seed, 5, 6);
            let found: Vec<BigInt> = Attack::new(params.clone(), &ys, AttackConfig::new(6))
                .unwrap()
                .seeds()
                .collect();
            assert!(found.contains(&seed));
        }
    }
}
