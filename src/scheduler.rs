use tracing::trace;

use crate::bus::ResultBuses;
use crate::inst::{Instruction, Tag, UnitClass};
use crate::regs::{RegEntry, RegisterFile};
use crate::scoreboard::Scoreboard;

/// A renamed source operand: ready, or waiting on the broadcast of `tag`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Operand {
    pub ready: bool,
    pub tag: Tag,
}

/// One scheduling-queue entry: an in-flight instruction's renamed operand
/// state and lifecycle flags, from allocation at dispatch through to the
/// deferred free after retirement.
#[derive(Debug, Clone, Default)]
pub struct ReservationStation {
    pub in_use: bool,
    pub class: UnitClass,
    pub dest: Option<u8>,
    pub dest_tag: Tag,
    pub src1: Operand,
    pub src2: Operand,
    pub fired: bool,
    pub completed: bool,
    pub mark_for_delete: bool,
    pub inst: Option<Instruction>,
}

fn rename_src(reg: Option<u8>, regs: &RegisterFile) -> Operand {
    match reg {
        None => Operand {
            ready: true,
            tag: Tag(0),
        },
        Some(r) => {
            let RegEntry { ready, tag } = regs.read(r);
            Operand { ready, tag }
        }
    }
}

/// Fixed-capacity arena of reservation stations. Slots are indexed, never
/// reallocated, and owned exclusively by the queue.
#[derive(Debug, Clone)]
pub struct SchedulingQueue {
    slots: Vec<ReservationStation>,
}

impl SchedulingQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![ReservationStation::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.slots.iter().filter(|s| s.in_use).count()
    }

    /// Indices of unused slots, in stable index order.
    pub fn free_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.in_use)
            .map(|(i, _)| i)
            .collect()
    }

    /// True if some in-use slot will eventually broadcast `tag`. A
    /// not-ready register whose producing tag has no live slot indicates a
    /// renaming defect.
    pub fn has_live_producer(&self, tag: Tag) -> bool {
        self.slots.iter().any(|s| s.in_use && s.dest_tag == tag)
    }

    /// Bind `inst` to the free slot `idx`, renaming its sources from the
    /// register file and claiming its destination register.
    pub fn allocate(
        &mut self,
        idx: usize,
        mut inst: Instruction,
        regs: &mut RegisterFile,
        cycle: u64,
    ) {
        let src1 = rename_src(inst.src[0], regs);
        let src2 = rename_src(inst.src[1], regs);
        debug_assert!(
            src1.ready || self.has_live_producer(src1.tag),
            "src1 of tag {} renamed to tag {} with no live producer",
            inst.tag,
            src1.tag,
        );
        debug_assert!(
            src2.ready || self.has_live_producer(src2.tag),
            "src2 of tag {} renamed to tag {} with no live producer",
            inst.tag,
            src2.tag,
        );

        let tag = inst.tag;
        inst.scheduled = Some(cycle);

        // The destination claim is snapshotted by later readers; this
        // supersedes any earlier in-flight writer of the same register.
        if let Some(dest) = inst.dest {
            regs.claim(dest, tag);
        }

        let slot = &mut self.slots[idx];
        debug_assert!(!slot.in_use, "allocated an in-use reservation station");
        *slot = ReservationStation {
            in_use: true,
            class: inst.class,
            dest: inst.dest,
            dest_tag: tag,
            src1,
            src2,
            fired: false,
            completed: false,
            mark_for_delete: false,
            inst: Some(inst),
        };

        trace!(%tag, slot = idx, "allocated reservation station");
    }

    /// Wake operands and completion flags from this cycle's broadcasts.
    /// Broadcasts are simultaneous within a cycle: every bus is read here,
    /// before the driver clears any of them.
    pub fn wake_on_broadcasts(&mut self, buses: &ResultBuses) {
        for slot in &mut self.slots {
            if !slot.in_use {
                continue;
            }

            for b in buses.active() {
                if !slot.src1.ready && slot.src1.tag == b.tag {
                    slot.src1.ready = true;
                }
                if !slot.src2.ready && slot.src2.tag == b.tag {
                    slot.src2.ready = true;
                }
                if slot.fired && !slot.completed && slot.dest_tag == b.tag {
                    slot.completed = true;
                }
            }
        }
    }

    /// Fire every entry whose operands are ready, in index order, as long
    /// as the scoreboard has a matching unit. Returns the count fired.
    pub fn fire_ready(&mut self, scoreboard: &mut Scoreboard, cycle: u64) -> u64 {
        let mut fired = 0;

        for slot in &mut self.slots {
            if slot.in_use && !slot.fired && slot.src1.ready && slot.src2.ready {
                if !scoreboard.try_issue(slot.class, slot.dest_tag, slot.dest) {
                    continue;
                }

                slot.fired = true;
                if let Some(inst) = slot.inst.as_mut() {
                    inst.executed = Some(cycle);
                }
                fired += 1;
                trace!(tag = %slot.dest_tag, class = %slot.class, "fired");
            }
        }

        fired
    }

    /// Stamp and emit completed instructions, deferring the slot free by
    /// one cycle so state-update releases it before the next dispatch.
    pub fn retire_completed(&mut self, cycle: u64) -> Vec<Instruction> {
        let mut retired = Vec::new();

        for slot in &mut self.slots {
            if slot.in_use && slot.completed && !slot.mark_for_delete {
                slot.mark_for_delete = true;
                if let Some(mut inst) = slot.inst.take() {
                    inst.retired = Some(cycle);
                    trace!(tag = %inst.tag, "retired");
                    retired.push(inst);
                }
            }
        }

        retired
    }

    /// Release slots marked for deletion on the previous cycle.
    pub fn free_deleted(&mut self) {
        for slot in &mut self.slots {
            if slot.mark_for_delete {
                *slot = ReservationStation::default();
            }
        }
    }

    pub fn slots(&self) -> &[ReservationStation] {
        &self.slots
    }
}
