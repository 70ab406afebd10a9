//! Parallel branch search.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use log::{debug, info};
use num_bigint::BigInt;
use rayon::prelude::*;

use super::{Attack, BranchOutcome};
use crate::error::BranchFailure;

/// How far to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Stop once any branch produces a validated seed.
    #[default]
    First,
    /// Evaluate every branch.
    Exhaustive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStatus {
    Found,
    Exhausted,
}

impl RecoveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStatus::Found => "found",
            RecoveryStatus::Exhausted => "exhausted",
        }
    }
}

/// Outcome of [`Attack::run`].
#[derive(Debug, Clone, Default)]
pub struct RecoveryReport {
    /// Validated seeds, deduplicated, ordered by the branch that found them.
    pub seeds: Vec<BigInt>,
    pub branches_total: u64,
    pub tried: u64,
    pub non_integral: u64,
    pub non_invertible: u64,
    pub too_many_candidates: u64,
    /// Retrieved candidates that failed validation.
    pub rejected_candidates: u64,
    pub elapsed: Duration,
}

impl RecoveryReport {
    pub fn status(&self) -> RecoveryStatus {
        if self.seeds.is_empty() {
            RecoveryStatus::Exhausted
        } else {
            RecoveryStatus::Found
        }
    }
}

#[derive(Default)]
struct Counters {
    tried: AtomicU64,
    non_integral: AtomicU64,
    non_invertible: AtomicU64,
    too_many_candidates: AtomicU64,
    rejected: AtomicU64,
}

impl Counters {
    fn record_failure(&self, failure: BranchFailure) {
        let counter = match failure {
            BranchFailure::NonIntegralSolution => &self.non_integral,
            BranchFailure::NonInvertibleMultiplier => &self.non_invertible,
            BranchFailure::TooManyCandidates => &self.too_many_candidates,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

type Hits = Mutex<Vec<(u64, Vec<BigInt>)>>;

/// Store the validated seeds of branch `index`, even if another worker
/// panicked while holding the lock.
fn record_hit(hits: &Hits, index: u64, viable: Vec<BigInt>) {
    let mut guard = hits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.push((index, viable));
}

impl Attack {
    /// Evaluate carry branches across the rayon pool.
    ///
    /// In [`SearchMode::First`] a shared flag stops workers once a seed is
    /// validated; branches already in flight still finish and their seeds are
    /// kept.
    pub fn run(&self, mode: SearchMode, progress: Option<&ProgressBar>) -> RecoveryReport {
        let start_time = Instant::now();
        let total = self.branches();

        if let Some(pb) = progress {
            pb.set_length(total);
            pb.set_position(0);
        }

        let found = AtomicBool::new(false);
        let counters = Counters::default();
        let hits: Hits = Mutex::new(Vec::new());

        (0..total).into_par_iter().for_each(|index| {
            if mode == SearchMode::First && found.load(Ordering::Acquire) {
                return;
            }

            counters.tried.fetch_add(1, Ordering::Relaxed);
            match self.evaluate_branch(index) {
                BranchOutcome::Failed(failure) => {
                    debug!("branch {:#b}: {}", index, failure);
                    counters.record_failure(failure);
                }
                BranchOutcome::Candidates { viable, rejected } => {
                    counters.rejected.fetch_add(rejected, Ordering::Relaxed);
                    if !viable.is_empty() {
                        found.store(true, Ordering::Release);
                        record_hit(&hits, index, viable);
                    }
                }
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        });

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let mut hits = hits.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        hits.sort_by_key(|(index, _)| *index);

        let mut seen = HashSet::new();
        let seeds: Vec<BigInt> = hits
            .into_iter()
            .flat_map(|(_, viable)| viable)
            .filter(|s| seen.insert(s.clone()))
            .collect();

        let report = RecoveryReport {
            seeds,
            branches_total: total,
            tried: counters.tried.load(Ordering::Relaxed),
            non_integral: counters.non_integral.load(Ordering::Relaxed),
            non_invertible: counters.non_invertible.load(Ordering::Relaxed),
            too_many_candidates: counters.too_many_candidates.load(Ordering::Relaxed),
            rejected_candidates: counters.rejected.load(Ordering::Relaxed),
            elapsed: start_time.elapsed(),
        };

        info!(
            "{}: {} seed(s) after {}/{} branches in {:.2}s",
            report.status().as_str(),
            report.seeds.len(),
            report.tried,
            report.branches_total,
            report.elapsed.as_secs_f64()
        );

        report
    }

    /// Sequential counterpart of [`Attack::run`], same report shape.
    pub fn run_sequential(&self, mode: SearchMode) -> RecoveryReport {
        let start_time = Instant::now();
        let mut report = RecoveryReport {
            branches_total: self.branches(),
            ..RecoveryReport::default()
        };
        let mut seen = HashSet::new();

        for index in 0..report.branches_total {
            report.tried += 1;
            match self.evaluate_branch(index) {
                BranchOutcome::Failed(BranchFailure::NonIntegralSolution) => report.non_integral += 1,
                BranchOutcome::Failed(BranchFailure::NonInvertibleMultiplier) => report.non_invertible += 1,
                BranchOutcome::Failed(BranchFailure::TooManyCandidates) => report.too_many_candidates += 1,
                BranchOutcome::Candidates { viable, rejected } => {
                    report.rejected_candidates += rejected;
                    for s in viable {
                        if seen.insert(s.clone()) {
                            report.seeds.push(s);
                        }
                    }
                }
            }
            if mode == SearchMode::First && !report.seeds.is_empty() {
                break;
            }
        }

        report.elapsed = start_time.elapsed();
        report
    }
}
