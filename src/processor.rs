use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, trace};

use crate::bus::ResultBuses;
use crate::config::{ConfigError, ProcConfig};
use crate::inst::{Instruction, Tag};
use crate::regs::RegisterFile;
use crate::scheduler::SchedulingQueue;
use crate::scoreboard::Scoreboard;
use crate::stats::{SimResult, StatsTracker};
use crate::trace::Trace;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("simulation exceeded {cap} cycles without retiring all instructions")]
    CycleLimit { cap: u64 },
}

/// The whole simulated core: register file, result buses, scheduling
/// queue, scoreboard and the dispatch buffer, advanced one cycle at a
/// time by `step`.
///
/// The stage order within a cycle is fixed: state-update, execute,
/// schedule, dispatch, fetch. Each stage only observes state committed by
/// the previous cycle's stages, so simulated hardware simultaneity never
/// depends on evaluation order. In particular an operand woken by this
/// cycle's broadcasts (schedule) fires no earlier than the next cycle's
/// execute.
#[derive(Debug, Clone)]
pub struct Processor {
    config: ProcConfig,
    regs: RegisterFile,
    buses: ResultBuses,
    queue: SchedulingQueue,
    scoreboard: Scoreboard,
    dispatch_buffer: VecDeque<Instruction>,
    trace: std::vec::IntoIter<Instruction>,
    cycle: u64,
    fetched: u64,
    retired: Vec<Instruction>,
    stats: StatsTracker,
}

impl Processor {
    pub fn new(config: ProcConfig, trace: Trace) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            regs: RegisterFile::new(),
            buses: ResultBuses::new(config.buses),
            queue: SchedulingQueue::new(config.queue_capacity()),
            scoreboard: Scoreboard::new(config.k0, config.k1, config.k2),
            dispatch_buffer: VecDeque::new(),
            trace: trace.into_iter(),
            cycle: 0,
            fetched: 0,
            retired: Vec::new(),
            stats: StatsTracker::default(),
        })
    }

    /// Run cycles until every fetched instruction has retired.
    pub fn run(mut self) -> Result<SimResult, SimError> {
        while !self.is_done() {
            if self.cycle >= self.config.max_cycles {
                return Err(SimError::CycleLimit {
                    cap: self.config.max_cycles,
                });
            }

            self.step();
        }

        debug!(
            cycles = self.cycle,
            retired = self.retired.len(),
            "simulation complete"
        );

        self.retired.sort_by_key(|inst| inst.tag);
        Ok(SimResult {
            stats: self.stats.finish(),
            insts: self.retired,
        })
    }

    pub fn is_done(&self) -> bool {
        self.cycle > 0 && self.trace.len() == 0 && self.retired.len() as u64 == self.fetched
    }

    /// Advance the simulation by one cycle.
    pub fn step(&mut self) {
        self.cycle += 1;

        let retired = self.state_update();
        let fired = self.execute();
        self.schedule();
        self.dispatch();
        self.fetch();

        self.stats
            .record_cycle(self.dispatch_buffer.len(), fired, retired);
    }

    // Free the slots marked on the previous cycle, then mark (and emit)
    // newly-completed instructions; those slots free next cycle.
    fn state_update(&mut self) -> u64 {
        self.queue.free_deleted();

        let retired = self.queue.retire_completed(self.cycle);
        let count = retired.len() as u64;
        self.retired.extend(retired);
        count
    }

    // Broadcast previously-completed units, complete busy ones, publish
    // results to the register file, then fire newly-ready entries.
    fn execute(&mut self) -> u64 {
        let published = self.scoreboard.broadcast(&mut self.buses);
        self.scoreboard.complete_busy_units();
        self.buses.apply_to_registers(&mut self.regs);
        let fired = self.queue.fire_ready(&mut self.scoreboard, self.cycle);

        if published > 0 || fired > 0 {
            debug!(cycle = self.cycle, published, fired, "execute");
        }

        fired
    }

    // Wake waiting operands from this cycle's broadcasts, then release the
    // buses for the next cycle.
    fn schedule(&mut self) {
        self.queue.wake_on_broadcasts(&self.buses);
        self.buses.clear();
    }

    // Drain the dispatch buffer in program order into free reservation
    // stations. Running out of slots is backpressure, not a fault; the
    // leftovers retry next cycle.
    fn dispatch(&mut self) {
        for idx in self.queue.free_slots() {
            let Some(inst) = self.dispatch_buffer.pop_front() else {
                break;
            };

            self.queue.allocate(idx, inst, &mut self.regs, self.cycle);
        }
    }

    fn fetch(&mut self) {
        for _ in 0..self.config.fetch_width {
            let Some(mut inst) = self.trace.next() else {
                break;
            };

            inst.tag = Tag(self.fetched);
            inst.fetched = Some(self.cycle);
            // First cycle the dispatch stage can see it.
            inst.dispatched = Some(self.cycle + 1);
            self.fetched += 1;

            trace!(cycle = self.cycle, tag = %inst.tag, "fetched");
            self.dispatch_buffer.push_back(inst);
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn queue(&self) -> &SchedulingQueue {
        &self.queue
    }

    pub fn dispatch_buffer_len(&self) -> usize {
        self.dispatch_buffer.len()
    }
}
