mod bus;
mod config;
mod inst;
mod processor;
mod regs;
mod scheduler;
mod scoreboard;
mod stats;
mod trace;

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{
    ProcConfig, DEFAULT_F, DEFAULT_K0, DEFAULT_K1, DEFAULT_K2, DEFAULT_MAX_CYCLES, DEFAULT_R,
};
use crate::processor::Processor;
use crate::trace::Trace;

#[derive(Parser, Debug)]
#[command(
    name = "procsim",
    about = "Cycle-accurate simulator of a Tomasulo-style out-of-order superscalar core"
)]
struct Cli {
    /// Instruction trace, one `<hex addr> <op class> <dest> <src1> <src2>` per line.
    trace: PathBuf,

    /// Number of result buses.
    #[arg(short = 'r', long = "buses", default_value_t = DEFAULT_R)]
    buses: usize,

    /// Number of k0 functional units.
    #[arg(long, default_value_t = DEFAULT_K0)]
    k0: usize,

    /// Number of k1 functional units.
    #[arg(long, default_value_t = DEFAULT_K1)]
    k1: usize,

    /// Number of k2 functional units.
    #[arg(long, default_value_t = DEFAULT_K2)]
    k2: usize,

    /// Instructions fetched per cycle.
    #[arg(short = 'f', long = "fetch", default_value_t = DEFAULT_F)]
    fetch: usize,

    /// Abort after this many simulated cycles.
    #[arg(long, default_value_t = DEFAULT_MAX_CYCLES)]
    max_cycles: u64,

    /// Print the per-instruction timing table.
    #[arg(long)]
    timing: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("procsim: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let contents = std::fs::read_to_string(&cli.trace)?;
    let trace = contents.parse::<Trace>()?;

    let config = ProcConfig {
        buses: cli.buses,
        k0: cli.k0,
        k1: cli.k1,
        k2: cli.k2,
        fetch_width: cli.fetch,
        max_cycles: cli.max_cycles,
    };

    let res = Processor::new(config, trace)?.run()?;

    if cli.timing {
        println!("{}", stats::timing_table(&res.insts));
    }

    println!("{}", res.stats);
    println!(
        "Simulator time elapsed: {:.2}s",
        start.elapsed().as_secs_f32()
    );

    Ok(())
}
