//! Instruction pipeline implementation.
//!
//! This module contains the five-stage pipeline control path. It includes:
//! 1. **Latches:** Inter-stage bundles (IF/ID, ID/EX, EX/MEM, MEM/WB).
//! 2. **Codec:** The fixed-width wire format of the bundles across the four
//!    layout generations.
//! 3. **Signals:** Control signals generated during instruction decode.
//! 4. **Hazards:** RAW and CSR/TLB serialization stall conditions.
//! 5. **Stages:** Fetch, Decode, Execute, Memory, and Writeback.

/// Stage bundle wire-format codec.
pub mod codec;

/// Hazard detection logic.
pub mod hazards;

/// Inter-stage pipeline latches.
pub mod latches;

/// Control signals generated during instruction decode.
pub mod signals;

/// Pipeline stage implementations.
pub mod stages;
