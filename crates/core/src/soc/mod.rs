//! Physical memory interface.
//!
//! The memory/bus system is an external collaborator of this core: the
//! pipeline only needs to issue physical-address accesses and consume range
//! faults as exception candidates. This module provides:
//! 1. **The Bus Seam:** The [`Bus`] trait the pipeline stages call into.
//! 2. **Range Faults:** [`BusFault`], converted by the stages into
//!    address-error exceptions (ADEF on fetch, ADEM on data accesses).
//! 3. **Flat RAM:** A reference implementation backing the test harness.

/// Flat RAM bus implementation.
pub mod ram;

use crate::common::{MemWidth, PhysAddr};

pub use ram::FlatRam;

/// A physical access that the bus could not satisfy (address out of range).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusFault {
    /// The offending physical address.
    pub addr: u32,
}

/// The physical memory bus consumed by the pipeline.
///
/// Implementations are free to model MMIO, latency, or side effects; the
/// core only requires that out-of-range accesses report a [`BusFault`]
/// rather than panic.
pub trait Bus {
    /// Fetches a 32-bit instruction word.
    fn fetch(&mut self, paddr: PhysAddr) -> Result<u32, BusFault>;

    /// Reads a value of the given width, zero-extended to 32 bits.
    fn read(&mut self, paddr: PhysAddr, width: MemWidth) -> Result<u32, BusFault>;

    /// Writes the low `width` bytes of `value`.
    fn write(&mut self, paddr: PhysAddr, width: MemWidth, value: u32) -> Result<(), BusFault>;
}
