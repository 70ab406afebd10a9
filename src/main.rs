//! lcg-lattice - Recover LCG seeds from truncated outputs.
//!
//! Lattice reduction plus carry enumeration, with exact big-integer arithmetic throughout.

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressBar;
use num_bigint::BigInt;
use std::io::Read;

use lcg_lattice::lcg::{default_shift, truncate_all, GeneratorParams, LcgVariant, ALL_VARIANTS};
use lcg_lattice::output::{format_report, format_report_json, format_states};
use lcg_lattice::parse::{parse_bigint, parse_bigint_list};
use lcg_lattice::recover::{reconstruct_lehmer_states, Attack, AttackConfig, SearchMode, DEFAULT_MAX_CANDIDATES};
use lcg_lattice::reduce::{IntegralLll, LllConfig};

fn parse_number(s: &str) -> Result<BigInt, String> {
    parse_bigint(s).map_err(|e| e.to_string())
}

fn parse_preset(s: &str) -> Result<LcgVariant, String> {
    LcgVariant::from_str(s).ok_or_else(|| {
        let names: Vec<&str> = ALL_VARIANTS.iter().map(|v| v.name).collect();
        format!("unknown preset '{}', expected one of: {}", s, names.join(", "))
    })
}

#[derive(Parser)]
#[command(name = "lcg-lattice")]
#[command(about = "Recover linear congruential generator state from truncated outputs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct GeneratorArgs {
    /// Known generator (glibc, minstd, msvc, borland, drand48)
    #[arg(long, value_parser = parse_preset, conflicts_with_all = ["modulus", "multiplier", "increment"])]
    preset: Option<LcgVariant>,

    /// Modulus m (decimal or 0x hex)
    #[arg(short, long, value_parser = parse_number)]
    modulus: Option<BigInt>,

    /// Multiplier a
    #[arg(short = 'a', long, value_parser = parse_number)]
    multiplier: Option<BigInt>,

    /// Increment b (default: 0, a Lehmer generator)
    #[arg(short = 'b', long, value_parser = parse_number)]
    increment: Option<BigInt>,
}

impl GeneratorArgs {
    fn resolve(&self) -> Result<GeneratorParams> {
        if let Some(variant) = self.preset {
            return Ok(variant.params());
        }

        let modulus = self
            .modulus
            .clone()
            .ok_or_else(|| anyhow!("--modulus is required unless --preset is given"))?;
        let multiplier = self
            .multiplier
            .clone()
            .ok_or_else(|| anyhow!("--multiplier is required unless --preset is given"))?;

        let mut builder = GeneratorParams::builder().modulus(modulus).multiplier(multiplier);
        if let Some(ref b) = self.increment {
            builder = builder.increment(b.clone());
        }
        Ok(builder.build()?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Recover the first state from truncated consecutive outputs
    Recover {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Number of unknown low bits per sample
        #[arg(short, long)]
        shift: usize,

        /// Use the first N samples for the lattice, at most 64 (default: 10; all are still validated)
        #[arg(long, value_name = "N")]
        window: Option<usize>,

        /// Skip branches with more than this many seed candidates
        #[arg(long, default_value_t = DEFAULT_MAX_CANDIDATES)]
        max_candidates: u64,

        /// Enumerate every carry branch instead of stopping at the first seed
        #[arg(long)]
        all: bool,

        /// Evaluate branches on a single thread
        #[arg(long)]
        sequential: bool,

        /// Use delta = 3/4 for reduction instead of 99/100
        #[arg(long)]
        classic_lll: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Observed outputs (decimal or 0x hex); read from stdin when omitted
        samples: Vec<String>,
    },

    /// Rebuild every full state of a truncated Lehmer sequence
    Lehmer {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Use delta = 3/4 for reduction instead of 99/100
        #[arg(long)]
        classic_lll: bool,

        /// Observed outputs (decimal or 0x hex); read from stdin when omitted
        samples: Vec<String>,
    },

    /// Print truncated outputs of a generator (for testing the attack)
    Simulate {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// First state
        #[arg(long, value_parser = parse_number)]
        seed: BigInt,

        /// Number of outputs, including the seed
        #[arg(short = 'n', long, default_value = "8")]
        count: usize,

        /// Low bits to blank (default: half the modulus bit length)
        #[arg(short, long)]
        shift: Option<usize>,

        /// Also print the full states
        #[arg(long)]
        full: bool,
    },

    /// List known generator presets
    Presets,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Recover {
            generator,
            shift,
            window,
            max_candidates,
            all,
            sequential,
            classic_lll,
            json,
            samples,
        } => {
            let mut config = AttackConfig::new(shift).with_max_candidates(max_candidates);
            if let Some(w) = window {
                config = config.with_window(w);
            }
            if classic_lll {
                config = config.with_lll(LllConfig::classic());
            }
            let mode = if all { SearchMode::Exhaustive } else { SearchMode::First };
            run_recover(&generator, config, mode, sequential, json, &samples)?;
        }
        Command::Lehmer {
            generator,
            classic_lll,
            samples,
        } => {
            run_lehmer(&generator, classic_lll, &samples)?;
        }
        Command::Simulate {
            generator,
            seed,
            count,
            shift,
            full,
        } => {
            run_simulate(&generator, &seed, count, shift, full)?;
        }
        Command::Presets => {
            for variant in ALL_VARIANTS {
                println!(
                    "{:<8} a={:<12} c={:<8} m={}",
                    variant.name, variant.a, variant.c, variant.m
                );
            }
        }
    }

    Ok(())
}

fn read_samples(args: &[String]) -> Result<Vec<BigInt>> {
    if !args.is_empty() {
        return args.iter().map(|s| parse_bigint(s)).collect();
    }

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let samples = parse_bigint_list(&input)?;
    if samples.is_empty() {
        bail!("no samples given on the command line or stdin");
    }
    Ok(samples)
}

fn run_recover(
    generator: &GeneratorArgs,
    config: AttackConfig,
    mode: SearchMode,
    sequential: bool,
    json_output: bool,
    sample_args: &[String],
) -> Result<()> {
    let params = generator.resolve()?;
    let samples = read_samples(sample_args)?;
    let shift = config.shift;

    if !json_output {
        eprintln!(
            "Preparing lattice for {} samples ({}-bit modulus, shift {})...",
            samples.len(),
            params.bits(),
            shift
        );
    }

    let attack = Attack::new(params.clone(), &samples, config)?;
    if !attack.is_determined() && !json_output {
        eprintln!("Warning: input is under-determined, no seed can be recovered.");
    }

    let report = if sequential {
        attack.run_sequential(mode)
    } else {
        let progress = if json_output {
            None
        } else {
            eprintln!("Enumerating {} carry branches...", attack.branches());
            let pb = ProgressBar::new(attack.branches());
            pb.set_style(lcg_lattice::default_progress_style());
            Some(pb)
        };
        attack.run(mode, progress.as_ref())
    };

    if json_output {
        println!("{}", format_report_json(&params, shift, &report));
    } else {
        print!("{}", format_report(&params, shift, &report));
    }

    Ok(())
}

fn run_lehmer(generator: &GeneratorArgs, classic_lll: bool, sample_args: &[String]) -> Result<()> {
    let params = generator.resolve()?;
    if !params.is_lehmer() {
        bail!("direct reconstruction needs a Lehmer generator (increment 0), got b = {}", params.increment());
    }
    let samples = read_samples(sample_args)?;

    let reducer = if classic_lll {
        IntegralLll::with_config(LllConfig::classic())
    } else {
        IntegralLll::new()
    };

    match reconstruct_lehmer_states(params.modulus(), params.multiplier(), &samples, &reducer)? {
        Some(states) => print!("{}", format_states(&states)),
        None => eprintln!("No consistent reconstruction: truncation is too deep for {} samples.", samples.len()),
    }

    Ok(())
}

fn run_simulate(
    generator: &GeneratorArgs,
    seed: &BigInt,
    count: usize,
    shift: Option<usize>,
    full: bool,
) -> Result<()> {
    let params = generator.resolve()?;
    let shift = shift.unwrap_or_else(|| default_shift(params.modulus()));

    let states = params.sequence(seed, count);
    let truncated = truncate_all(&states, shift);

    eprintln!("shift = {}", shift);
    for (state, sample) in states.iter().zip(&truncated) {
        if full {
            println!("{} {}", sample, state);
        } else {
            println!("{}", sample);
        }
    }

    Ok(())
}
