//! Text and JSON rendering of recovery results.

use num_bigint::BigInt;

use crate::lcg::GeneratorParams;
use crate::parse::to_hex;
use crate::recover::{RecoveryReport, RecoveryStatus};

impl RecoveryStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            RecoveryStatus::Found => "✓",
            RecoveryStatus::Exhausted => "✗",
        }
    }
}

pub fn format_report(params: &GeneratorParams, shift: usize, report: &RecoveryReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Modulus:    {} ({} bits)\n", params.modulus(), params.bits()));
    output.push_str(&format!("Multiplier: {}\n", params.multiplier()));
    output.push_str(&format!("Increment:  {}\n", params.increment()));
    output.push_str(&format!("Shift:      {}\n", shift));
    output.push_str("---\n");

    let status = report.status();
    output.push_str(&format!(
        "{} {} ({} of {} branches, {:.2}s)\n",
        status.symbol(),
        status.as_str().to_uppercase(),
        report.tried,
        report.branches_total,
        report.elapsed.as_secs_f64()
    ));

    for seed in &report.seeds {
        output.push_str(&format!("  seed = {} ({})\n", seed, to_hex(seed)));
    }

    output.push_str(&format!(
        "  rejected: non_integral={} non_invertible={} too_many_candidates={} invalid_candidates={}\n",
        report.non_integral, report.non_invertible, report.too_many_candidates, report.rejected_candidates
    ));

    output
}

pub fn format_report_json(params: &GeneratorParams, shift: usize, report: &RecoveryReport) -> String {
    let seeds_json: Vec<String> = report
        .seeds
        .iter()
        .map(|s| format!("    {{\"decimal\": \"{}\", \"hex\": \"{}\"}}", s, to_hex(s)))
        .collect();

    format!(
        r#"{{
  "modulus": "{}",
  "multiplier": "{}",
  "increment": "{}",
  "shift": {},
  "status": "{}",
  "branches_total": {},
  "tried": {},
  "non_integral": {},
  "non_invertible": {},
  "too_many_candidates": {},
  "rejected_candidates": {},
  "elapsed_secs": {:.3},
  "seeds": [
{}
  ]
}}"#,
        params.modulus(),
        params.multiplier(),
        params.increment(),
        shift,
        report.status().as_str(),
        report.branches_total,
        report.tried,
        report.non_integral,
        report.non_invertible,
        report.too_many_candidates,
        report.rejected_candidates,
        report.elapsed.as_secs_f64(),
        seeds_json.join(",\n")
    )
}

/// One state per line as `index: decimal (hex)`.
pub fn format_states(states: &[BigInt]) -> String {
    states
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{:>3}: {} ({})\n", i, s, to_hex(s)))
        .collect()
}
