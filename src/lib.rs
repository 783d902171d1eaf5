use thiserror::Error;

pub mod bus;
pub mod config;
pub mod inst;
pub mod processor;
pub mod regs;
pub mod scheduler;
pub mod scoreboard;
pub mod stats;
pub mod trace;

use config::{ConfigError, ProcConfig};
use processor::{Processor, SimError};
use stats::SimResult;
use trace::{Trace, TraceError};

#[derive(Debug, Error)]
pub enum ProcError {
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Parse a trace from `contents` and run it to completion under `config`.
pub fn parse_and_run(contents: &str, config: ProcConfig) -> Result<SimResult, ProcError> {
    let trace = contents.parse::<Trace>()?;
    let proc = Processor::new(config, trace)?;
    Ok(proc.run()?)
}
