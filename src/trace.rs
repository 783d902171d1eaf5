use crate::inst::{InstError, Instruction};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("error parsing trace line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: InstError,
    },
}

/// A parsed instruction trace, in program order. Tags are not assigned
/// here; the fetch stage stamps them as instructions enter the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    insts: Vec<Instruction>,
}

impl FromStr for Trace {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut insts = Vec::new();

        for (i, line) in s.lines().enumerate() {
            // Strip comments and empty lines
            let line = line.trim();
            let line = &line[..line.find('#').unwrap_or(line.len())];
            if line.is_empty() {
                continue;
            }

            // Line numbers start at 1
            match line.parse::<Instruction>() {
                Ok(inst) => insts.push(inst),
                Err(source) => return Err(TraceError::Line { line: i + 1, source }),
            }
        }

        Ok(Trace { insts })
    }
}

impl Trace {
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }
}

impl IntoIterator for Trace {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.insts.into_iter()
    }
}
