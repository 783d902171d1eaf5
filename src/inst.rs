use num_enum::TryFromPrimitive;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter};
use thiserror::Error;

use crate::regs::NUM_REGS;

/// Program-order index assigned at fetch time. Doubles as the renaming
/// identifier and the retirement sort key.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub u64);

impl From<u64> for Tag {
    fn from(v: u64) -> Self {
        Tag(v)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Functional-unit class an instruction executes on.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, Hash, TryFromPrimitive, Display, EnumIter,
)]
#[repr(u8)]
pub enum UnitClass {
    K0,
    #[default]
    K1,
    K2,
}

impl UnitClass {
    /// Decode the raw op class field from a trace line. The sentinel -1
    /// means no class and maps to K1.
    pub fn from_raw(raw: i64) -> Result<Self, InstError> {
        if raw == -1 {
            return Ok(UnitClass::K1);
        }

        u8::try_from(raw)
            .ok()
            .and_then(|v| UnitClass::try_from(v).ok())
            .ok_or(InstError::OpClass(raw))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstError {
    #[error("expected 5 whitespace-separated fields, found {0}")]
    FieldCount(usize),
    #[error("invalid instruction address '{0}'")]
    Address(String),
    #[error("invalid integer field '{0}'")]
    Field(String),
    #[error("op class {0} out of range (-1..=2)")]
    OpClass(i64),
    #[error("register index {0} out of range (-1..=127)")]
    Register(i64),
}

/// One instruction record from the input trace plus the cycle numbers
/// stamped as it moves through the pipeline. No operation semantics are
/// modeled; only the register indices and the unit class matter for timing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instruction {
    pub address: u32,
    pub class: UnitClass,
    pub src: [Option<u8>; 2],
    pub dest: Option<u8>,

    pub tag: Tag,

    pub fetched: Option<u64>,
    pub dispatched: Option<u64>,
    pub scheduled: Option<u64>,
    pub executed: Option<u64>,
    pub retired: Option<u64>,
}

fn reg_field(raw: i64) -> Result<Option<u8>, InstError> {
    if raw == -1 {
        return Ok(None);
    }

    u8::try_from(raw)
        .ok()
        .filter(|&r| usize::from(r) < NUM_REGS)
        .map(Some)
        .ok_or(InstError::Register(raw))
}

impl FromStr for Instruction {
    type Err = InstError;

    // Trace line format: `<hex address> <op class> <dest> <src1> <src2>`,
    // with -1 meaning "none" for the class and register fields.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split_whitespace().collect::<Vec<_>>();
        if fields.len() != 5 {
            return Err(InstError::FieldCount(fields.len()));
        }

        let address = u32::from_str_radix(fields[0].trim_start_matches("0x"), 16)
            .map_err(|_| InstError::Address(fields[0].to_string()))?;

        let int_field = |n: usize| -> Result<i64, InstError> {
            fields[n]
                .parse::<i64>()
                .map_err(|_| InstError::Field(fields[n].to_string()))
        };

        Ok(Instruction {
            address,
            class: UnitClass::from_raw(int_field(1)?)?,
            dest: reg_field(int_field(2)?)?,
            src: [reg_field(int_field(3)?)?, reg_field(int_field(4)?)?],
            ..Default::default()
        })
    }
}
