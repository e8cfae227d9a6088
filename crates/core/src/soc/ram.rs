//! Flat RAM bus implementation.
//!
//! A single contiguous little-endian memory region starting at a configurable
//! base address. Accesses outside the region report a [`BusFault`]; there is
//! no MMIO and no access latency. This is the memory model used by the test
//! harness and by callers that do not bring their own bus.

use crate::common::{MemWidth, PhysAddr};

use super::{Bus, BusFault};

/// A flat, contiguous RAM region.
#[derive(Clone, Debug)]
pub struct FlatRam {
    base: u32,
    data: Vec<u8>,
}

impl FlatRam {
    /// Creates a zero-filled RAM of `size` bytes starting at `base`.
    pub fn new(base: u32, size: usize) -> Self {
        Self {
            base,
            data: vec![0; size],
        }
    }

    /// Copies `bytes` into RAM starting at physical address `paddr`.
    ///
    /// Used by tests and loaders to place code and data before reset.
    ///
    /// # Panics
    ///
    /// Panics if the range falls outside the RAM region; loading outside
    /// memory is a harness bug, not a simulated fault.
    pub fn load(&mut self, paddr: u32, bytes: &[u8]) {
        let start = (paddr - self.base) as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn offset(&self, paddr: u32, len: u32) -> Result<usize, BusFault> {
        let end = paddr.wrapping_add(len);
        if paddr < self.base
            || end < paddr
            || (end - self.base) as usize > self.data.len()
        {
            return Err(BusFault { addr: paddr });
        }
        Ok((paddr - self.base) as usize)
    }
}

impl Bus for FlatRam {
    fn fetch(&mut self, paddr: PhysAddr) -> Result<u32, BusFault> {
        self.read(paddr, MemWidth::Word)
    }

    fn read(&mut self, paddr: PhysAddr, width: MemWidth) -> Result<u32, BusFault> {
        let len = width.bytes();
        let at = self.offset(paddr.val(), len)?;
        let mut val = 0u32;
        for i in 0..len as usize {
            val |= u32::from(self.data[at + i]) << (8 * i);
        }
        Ok(val)
    }

    fn write(&mut self, paddr: PhysAddr, width: MemWidth, value: u32) -> Result<(), BusFault> {
        let len = width.bytes();
        let at = self.offset(paddr.val(), len)?;
        for i in 0..len as usize {
            self.data[at + i] = (value >> (8 * i)) as u8;
        }
        Ok(())
    }
}
