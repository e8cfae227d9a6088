//! CPU core: architectural state, pipeline, and translation units.
//!
//! 1. **`arch`:** CSR file and privilege levels.
//! 2. **`cpu`:** The `Cpu` container and cycle loop.
//! 3. **`pipeline`:** Latches, codec, signals, hazards, and stages.
//! 4. **`units`:** The memory management unit.

/// Architectural state (CSRs, privilege levels).
pub mod arch;

/// CPU container and execution loop.
pub mod cpu;

/// Five-stage pipeline control path.
pub mod pipeline;

/// Hardware units (MMU).
pub mod units;

pub use cpu::Cpu;
