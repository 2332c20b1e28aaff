//! Command-line harness measuring chained multiplication latency.
//!
//! Usage:
//!   cycle-probe <seed>                  # seeds 0 and 1 exercise special-case
//!                                       # multiplier paths, anything else
//!                                       # (e.g. 3) the general case
//!   cycle-probe --trials 200 3          # override measurement parameters
//!   cycle-probe --help                  # show help
//!
//! The seed comes in as a program argument so the compiler cannot fold the
//! accumulator chains away.

use cycle_probe::measure::MeasureParams;
use cycle_probe::registry::build_registry;
use cycle_probe::utils::CpuPinGuard;
use cycle_probe::workloads::residue_byte;
use cycle_probe::tui;
use std::env;

fn print_help() {
    println!("usage: cycle-probe [options] <seed>");
    println!();
    println!("Measures the per-multiplication latency of chained 32-bit, 64-bit and");
    println!("widening (64x64->128, high half) multiplications on the current core.");
    println!();
    println!("The seed initializes the accumulators: 0 and 1 keep them degenerate");
    println!("(special-case paths of a variable-time multiplier), any other value");
    println!("(e.g. 3) goes pseudorandom and exercises the general case.");
    println!();
    println!("options:");
    println!("  --iter N      block repetitions per timed span (default 1000)");
    println!("  --trials N    timed spans per workload (default 120)");
    println!("  --warmup N    leading spans to discard (default 20)");
    println!("  --help, -h    show this help");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{}", message);
    eprintln!("usage: cycle-probe [--iter N] [--trials N] [--warmup N] <seed>");
    std::process::exit(1);
}

fn parse_value(args: &[String], i: usize) -> usize {
    match args.get(i).and_then(|v| v.parse().ok()) {
        Some(v) => v,
        None => usage_error(&format!("option {} needs a numeric value", args[i - 1])),
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut params = MeasureParams::default();
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return;
            }
            "--iter" => {
                i += 1;
                params.iterations = parse_value(&args, i);
            }
            "--trials" => {
                i += 1;
                params.trials = parse_value(&args, i);
            }
            "--warmup" => {
                i += 1;
                params.warmup = parse_value(&args, i);
            }
            arg if !arg.starts_with('-') => match arg.parse() {
                Ok(v) => seed = Some(v),
                Err(_) => usage_error(&format!("invalid seed: {}", arg)),
            },
            arg => usage_error(&format!("unknown option: {}", arg)),
        }
        i += 1;
    }

    let seed = match seed {
        Some(seed) => seed,
        None => usage_error("missing seed argument"),
    };
    if params.iterations == 0 {
        usage_error("--iter must be at least 1");
    }
    if params.warmup >= params.trials {
        usage_error("--warmup must be smaller than --trials");
    }

    // Stay on one core for the whole run; counter values do not survive
    // migration.
    let pin = CpuPinGuard::new();
    match pin.core_id() {
        Some(core) => log::info!("pinned to core {}", core),
        None => log::warn!("could not pin to a core; samples may be noisy"),
    }

    let registry = build_registry();
    tui::print_header();

    let mut reports = Vec::new();
    for workload in registry.all() {
        reports.push(workload.run(seed, &params));
    }
    tui::print_report(&reports);

    // Observing a byte of the last accumulator is what keeps all the
    // multiplication chains alive through optimization.
    if let Some(last) = reports.last() {
        tui::print_residue(residue_byte(last.residue));
    }
}
