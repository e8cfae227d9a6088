//! Simulation statistics collection and reporting.
//!
//! This module tracks metrics for the simulator core. It provides:
//! 1. **Cycle counts:** Total cycles and retired instructions.
//! 2. **Control path:** Exceptions, interrupts, and ERTN counts by class.
//! 3. **TLB behavior:** Refill, hit, and advisory multiple-match counts.
//! 4. **Stalls:** Data-hazard and serialization stall counts.

use serde::Serialize;

/// Simulation statistics structure tracking control-path metrics.
///
/// Collects statistics about exception traffic, TLB behavior, and pipeline
/// stalls for analysis; serializable to JSON for external reporting.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SimStats {
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions committed (retired).
    pub instructions_retired: u64,

    /// Number of exceptions taken (excluding interrupts).
    pub exceptions_taken: u64,
    /// Number of interrupts taken.
    pub interrupts_taken: u64,
    /// Number of exception returns (ERTN) committed.
    pub ertn_count: u64,

    /// Number of TLB refill exceptions raised.
    pub tlb_refills: u64,
    /// Number of advisory multiple-match conditions observed on search.
    pub tlb_multi_hits: u64,

    /// Stall cycles due to data hazards (RAW dependencies).
    pub stalls_data: u64,
    /// Stall cycles due to CSR/TLB serialization.
    pub stalls_serialize: u64,
    /// Number of pipeline flushes (exception, interrupt, or ERTN commit).
    pub flushes: u64,
}

impl SimStats {
    /// Creates a new zeroed statistics block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cycles per retired instruction, or 0.0 before the first commit.
    pub fn cpi(&self) -> f64 {
        if self.instructions_retired == 0 {
            0.0
        } else {
            self.cycles as f64 / self.instructions_retired as f64
        }
    }
}
