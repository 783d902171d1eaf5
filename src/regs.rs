use crate::inst::Tag;

pub const NUM_REGS: usize = 128;

/// A logical register: either ready (value committed) or pending on the
/// in-flight instruction identified by `tag`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegEntry {
    pub ready: bool,
    pub tag: Tag,
}

impl Default for RegEntry {
    fn default() -> Self {
        Self {
            ready: true,
            tag: Tag(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterFile {
    regs: [RegEntry; NUM_REGS],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            regs: [RegEntry::default(); NUM_REGS],
        }
    }

    pub fn read(&self, reg: u8) -> RegEntry {
        self.regs[usize::from(reg)]
    }

    /// Rename `reg` to the in-flight producer `tag`. Supersedes any prior
    /// claim by an earlier writer (last-writer-wins).
    pub fn claim(&mut self, reg: u8, tag: Tag) {
        self.regs[usize::from(reg)] = RegEntry { ready: false, tag };
    }

    /// Flip `reg` ready in response to a broadcast of `tag`. Refuses stale
    /// broadcasts: a later writer may already hold the claim on `reg`.
    pub fn settle(&mut self, reg: u8, tag: Tag) -> bool {
        let entry = &mut self.regs[usize::from(reg)];
        if !entry.ready && entry.tag == tag {
            entry.ready = true;
            true
        } else {
            false
        }
    }
}
