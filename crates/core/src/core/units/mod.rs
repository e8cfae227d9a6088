//! Hardware units attached to the pipeline.
//!
//! Currently the memory management unit (TLB plus translation logic); the
//! execution datapath units are external collaborators of this core.

/// Memory management unit (TLB, mapping windows, translation).
pub mod mmu;
