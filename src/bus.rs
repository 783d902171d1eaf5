use crate::inst::Tag;
use crate::regs::RegisterFile;

/// One cycle's worth of a completed instruction's result: its tag and the
/// destination register (if any) for consumers to match against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub tag: Tag,
    pub dest: Option<u8>,
}

/// The shared broadcast channels. Each slot carries at most one completed
/// instruction per cycle and is reset to idle once consumed.
#[derive(Debug, Clone)]
pub struct ResultBuses {
    slots: Vec<Option<Broadcast>>,
}

impl ResultBuses {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_idle(&self, slot: usize) -> bool {
        self.slots[slot].is_none()
    }

    pub fn publish(&mut self, slot: usize, broadcast: Broadcast) {
        debug_assert!(self.is_idle(slot));
        self.slots[slot] = Some(broadcast);
    }

    /// All broadcasts active this cycle. Consumers must read every bus
    /// before any is cleared; within a cycle broadcasts are simultaneous.
    pub fn active(&self) -> impl Iterator<Item = Broadcast> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Apply every active broadcast to the register file. A register flips
    /// ready only if its current claim still matches the broadcast tag.
    pub fn apply_to_registers(&self, regs: &mut RegisterFile) {
        for b in self.active() {
            if let Some(dest) = b.dest {
                let _ = regs.settle(dest, b.tag);
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
    }
}
