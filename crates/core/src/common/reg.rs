//! General-purpose register file.
//!
//! This module provides the `RegisterFile` struct holding the 32 general-purpose
//! registers of the core. It provides:
//! 1. **Storage:** The architectural GPR array with `r0` hardwired to zero.
//! 2. **Access:** Read and write methods enforcing the zero-register rule.
//! 3. **Observability:** A debugging dump of register state during simulation.

/// Number of general-purpose registers.
pub const GPR_COUNT: usize = 32;

/// Index of the hardwired zero register `r0`.
pub const REG_ZERO: usize = 0;

/// General-purpose register file.
///
/// Register `r0` reads as zero and ignores writes; the remaining 31 registers
/// hold 32-bit values. The pipeline writes registers only at commit, so the
/// file always reflects the architectural (in-order) state.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    regs: [u32; GPR_COUNT],
}

impl RegisterFile {
    /// Creates a new register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self {
            regs: [0; GPR_COUNT],
        }
    }

    /// Reads a value from a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31). Register `r0` always returns 0.
    pub fn read(&self, idx: usize) -> u32 {
        self.regs[idx & (GPR_COUNT - 1)]
    }

    /// Writes a value to a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31). Writes to `r0` are ignored.
    /// * `val` - The 32-bit value to write.
    pub fn write(&mut self, idx: usize, val: u32) {
        if idx != REG_ZERO {
            self.regs[idx & (GPR_COUNT - 1)] = val;
        }
    }

    /// Dumps the contents of all general-purpose registers via `tracing`.
    ///
    /// Useful for debugging register state during simulation.
    pub fn dump(&self) {
        for (i, chunk) in self.regs.chunks(4).enumerate() {
            tracing::debug!(
                "r{:02}..r{:02}: {:#010x} {:#010x} {:#010x} {:#010x}",
                i * 4,
                i * 4 + 3,
                chunk[0],
                chunk[1],
                chunk[2],
                chunk[3]
            );
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
