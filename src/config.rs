use thiserror::Error;

pub const DEFAULT_K0: usize = 1;
pub const DEFAULT_K1: usize = 2;
pub const DEFAULT_K2: usize = 3;
pub const DEFAULT_R: usize = 8;
pub const DEFAULT_F: usize = 4;

/// Safety net against configurations that can never retire; the model
/// itself has no timeout.
pub const DEFAULT_MAX_CYCLES: u64 = 10_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one functional unit is required")]
    NoUnits,
    #[error("at least one result bus is required")]
    NoBuses,
    #[error("fetch width must be at least 1")]
    NoFetch,
}

/// Processor shape: result-bus count, per-class functional-unit counts and
/// fetch width. The scheduling queue holds `2 * (k0 + k1 + k2)` slots.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProcConfig {
    pub buses: usize,
    pub k0: usize,
    pub k1: usize,
    pub k2: usize,
    pub fetch_width: usize,
    pub max_cycles: u64,
}

impl Default for ProcConfig {
    fn default() -> Self {
        Self {
            buses: DEFAULT_R,
            k0: DEFAULT_K0,
            k1: DEFAULT_K1,
            k2: DEFAULT_K2,
            fetch_width: DEFAULT_F,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

impl ProcConfig {
    pub fn total_units(&self) -> usize {
        self.k0 + self.k1 + self.k2
    }

    pub fn queue_capacity(&self) -> usize {
        2 * self.total_units()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_units() == 0 {
            return Err(ConfigError::NoUnits);
        }
        if self.buses == 0 {
            return Err(ConfigError::NoBuses);
        }
        if self.fetch_width == 0 {
            return Err(ConfigError::NoFetch);
        }

        Ok(())
    }
}
