use std::fmt;

use crate::inst::Instruction;

/// Aggregate performance counters for one simulation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStats {
    pub retired_instructions: u64,
    pub cycle_count: u64,
    pub max_disp_size: usize,
    pub avg_disp_size: f64,
    pub avg_inst_fired: f64,
    pub avg_inst_retired: f64,
}

/// Final state handed to the reporting side: the counters plus the
/// per-instruction timing records in program order.
#[derive(Debug, Clone, PartialEq)]
pub struct SimResult {
    pub stats: ProcStats,
    pub insts: Vec<Instruction>,
}

/// Per-cycle accumulator the driver feeds once per simulated cycle.
#[derive(Debug, Clone, Default)]
pub struct StatsTracker {
    cycles: u64,
    fired_total: u64,
    retired_total: u64,
    disp_size_total: u64,
    max_disp_size: usize,
}

impl StatsTracker {
    pub fn record_cycle(&mut self, disp_size: usize, fired: u64, retired: u64) {
        self.cycles += 1;
        self.fired_total += fired;
        self.retired_total += retired;
        self.disp_size_total += disp_size as u64;
        self.max_disp_size = self.max_disp_size.max(disp_size);
    }

    pub fn finish(&self) -> ProcStats {
        let cycles = self.cycles.max(1) as f64;

        ProcStats {
            retired_instructions: self.retired_total,
            cycle_count: self.cycles,
            max_disp_size: self.max_disp_size,
            avg_disp_size: self.disp_size_total as f64 / cycles,
            avg_inst_fired: self.fired_total as f64 / cycles,
            avg_inst_retired: self.retired_total as f64 / cycles,
        }
    }
}

impl fmt::Display for ProcStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processor stats:")?;
        writeln!(
            f,
            "Total instructions retired: {}",
            self.retired_instructions
        )?;
        writeln!(f, "Avg dispatch queue size: {:.6}", self.avg_disp_size)?;
        writeln!(f, "Maximum dispatch queue size: {}", self.max_disp_size)?;
        writeln!(f, "Avg inst fired per cycle: {:.6}", self.avg_inst_fired)?;
        writeln!(f, "Avg inst retired per cycle: {:.6}", self.avg_inst_retired)?;
        write!(f, "Total run time (cycles): {}", self.cycle_count)
    }
}

/// Diagnostic per-instruction timing table, one row per tag.
pub fn timing_table(insts: &[Instruction]) -> String {
    fn cycle(c: Option<u64>) -> String {
        c.map_or_else(|| "-".to_string(), |c| c.to_string())
    }

    let mut out = String::from("TAG\tFETCH\tDISP\tSCHED\tEXEC\tSTATE\n");
    for inst in insts {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            inst.tag,
            cycle(inst.fetched),
            cycle(inst.dispatched),
            cycle(inst.scheduled),
            cycle(inst.executed),
            cycle(inst.retired),
        ));
    }

    out
}
