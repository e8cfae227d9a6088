//! Pipeline stage implementations.
//!
//! One module per stage: Fetch, Decode, Execute, Memory, Writeback. Stages
//! are evaluated commit-first each cycle so every stage reads the previous
//! cycle's latches (synchronous register semantics).

/// Instruction fetch stage.
pub mod fetch;

/// Instruction decode stage.
pub mod decode;

/// Execute stage.
pub mod execute;

/// Memory access stage.
pub mod memory;

/// Writeback (commit) stage.
pub mod writeback;
