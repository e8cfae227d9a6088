//! Cycle-level functional simulator of the exception/CSR/TLB control path of
//! a 32-bit LoongArch-style five-stage pipeline.
//!
//! This crate implements the parts of a pipelined core that make precise
//! exceptions and virtual memory hard:
//! 1. **Pipeline:** Four inter-stage bundles with first-fault-wins
//!    propagation, stall/flush/redirect control, and a fixed-width wire
//!    codec across four historical layout generations.
//! 2. **CSRs:** Field-masked, commit-ordered control and status registers
//!    with exception entry/return and the countdown timer.
//! 3. **TLB:** A fully associative translation store with search, indexed
//!    read/write, replacement fill, and the INVTLB selector family.
//! 4. **Collaborator Seams:** Traits for the external instruction decoder
//!    and physical memory bus, with reference implementations.

/// Common types (addresses, registers, exceptions, access kinds).
pub mod common;
/// Simulator configuration (generations, defaults).
pub mod config;
/// CPU core (architectural state, pipeline, MMU).
pub mod core;
/// System/privileged instruction subset (decoder seam and reference decoder).
pub mod isa;
/// Physical memory interface (bus seam and flat RAM).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Main CPU type; holds the pipeline, CSR file, and TLB.
pub use crate::core::Cpu;
