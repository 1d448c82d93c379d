// ABOUTME: Developer smoke tool: builds a flat pond or a one-cell-drain grid and prints StepReport
// ABOUTME: Not the application CLI the core's scope excludes; this is a validation driver only

use clap::{Parser, ValueEnum};
use flowcore::{Driver, Fields, InfiltrationModel, Options};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// Flat pond at rest: exercises hydrostatic equilibrium (near-zero flux).
    Pond,
    /// S1-style one-cell drain on a 3x3 grid.
    Drain,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "flowcore validation smoke driver")]
struct Args {
    #[arg(value_enum, default_value_t = Scenario::Drain)]
    scenario: Scenario,

    /// Simulation end time, seconds.
    #[arg(long, default_value_t = 1.0)]
    until: f64,

    /// Grid side length (ignored for `drain`, which is fixed at 3x3).
    #[arg(long, default_value_t = 10)]
    size: usize,
}

fn build_fields(scenario: Scenario, size: usize) -> Fields {
    match scenario {
        Scenario::Drain => {
            let mut f = Fields::new(3, 3);
            f.h.set(1, 1, 0.1);
            f.n.fill(0.03);
            f
        }
        Scenario::Pond => {
            let mut f = Fields::new(size, size);
            f.h.fill(0.3);
            f.n.fill(0.03);
            f
        }
    }
}

fn main() {
    let args = Args::parse();
    let fields = build_fields(args.scenario, args.size);

    let mut opts = Options::default();
    opts.dtmax = 0.1;

    let mut driver = match Driver::new(fields, opts, InfiltrationModel::None) {
        Ok(d) => d,
        Err(err) => {
            eprintln!("configuration rejected: {err}");
            std::process::exit(1);
        }
    };

    match driver.advance(args.until) {
        Ok(report) => {
            println!("{report:#?}");
            let accum = driver.take_record_accumulators();
            println!("{accum:#?}");
        }
        Err(err) => {
            eprintln!("advance failed: {err}");
            std::process::exit(1);
        }
    }
}

