//! Memory Management Unit.
//!
//! This module implements virtual-to-physical address translation. It provides:
//! 1. **Mode Selection:** Direct address mode, direct-mapping windows, and
//!    paged TLB translation, in that priority order.
//! 2. **Fault Classification:** Page faults (PIL/PIS/PIF), privilege faults
//!    (PPI), modify faults (PME), and TLB refills per access type.
//! 3. **Advisory Accounting:** Counts multiple-match conditions observed
//!    during translation.

/// Translation lookaside buffer implementation.
pub mod tlb;

use crate::common::addr::{PhysAddr, VirtAddr};
use crate::common::error::Exception;
use crate::common::AccessType;
use crate::core::arch::csr::{CsrFile, DMW_PLV0, DMW_PLV3, DMW_PSEG_SHIFT, DMW_VSEG_SHIFT};
use crate::core::arch::mode::PrivilegeLevel;
use tlb::Tlb;

/// A successful translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Translation {
    /// The translated physical address.
    pub paddr: PhysAddr,
    /// Memory access type of the mapping (cached/uncached attribute).
    pub mat: u8,
}

/// Memory management unit: the TLB plus the translation decision logic.
///
/// The MMU holds no architectural registers of its own; every input to the
/// translation decision (mode bits, windows, ASID) lives in the CSR file.
#[derive(Clone, Debug)]
pub struct Mmu {
    /// The translation lookaside buffer.
    pub tlb: Tlb,
    /// Advisory count of TLB multiple-match conditions seen on lookups.
    pub multi_hits: u64,
}

impl Mmu {
    /// Creates an MMU with a cleared TLB of `tlb_entries` slots.
    pub fn new(tlb_entries: usize) -> Self {
        Self {
            tlb: Tlb::new(tlb_entries),
            multi_hits: 0,
        }
    }

    /// Translates a virtual address for the given access type.
    ///
    /// Priority order: direct address mode (identity), then the two
    /// direct-mapping windows, then the TLB. Failed TLB translations raise
    /// the access-specific page fault; a missing entry raises the refill
    /// exception, which vectors separately.
    pub fn translate(
        &mut self,
        csrs: &CsrFile,
        vaddr: VirtAddr,
        access: AccessType,
    ) -> Result<Translation, Exception> {
        let va = vaddr.val();

        if csrs.direct_address_mode() {
            return Ok(Translation {
                paddr: PhysAddr::new(va),
                mat: 0,
            });
        }

        let plv = csrs.plv();
        for dmw in [csrs.dmw0, csrs.dmw1] {
            if let Some(paddr) = window_hit(dmw, va, plv) {
                return Ok(Translation {
                    paddr: PhysAddr::new(paddr),
                    mat: ((dmw >> 4) & 0x3) as u8,
                });
            }
        }

        let Some(hit) = self.tlb.search(va, csrs.asid_value()) else {
            return Err(Exception::TlbRefill(va));
        };
        if hit.multiple_match {
            self.multi_hits += 1;
        }

        if !hit.page.valid {
            return Err(match access {
                AccessType::Fetch => Exception::FetchPageInvalid(va),
                AccessType::Load => Exception::LoadPageInvalid(va),
                AccessType::Store => Exception::StorePageInvalid(va),
            });
        }
        if plv.to_u8() > hit.page.plv {
            return Err(Exception::PagePrivilegeFault(va));
        }
        if access == AccessType::Store && !hit.page.dirty {
            return Err(Exception::PageModifyFault(va));
        }

        let page_mask = (1u32 << hit.ps) - 1;
        let paddr = ((hit.page.ppn << 12) & !page_mask) | (va & page_mask);
        Ok(Translation {
            paddr: PhysAddr::new(paddr),
            mat: hit.page.mat,
        })
    }
}

/// Checks one direct-mapping window register against an address.
///
/// A window hits when its virtual segment matches the address's top three
/// bits and the window is enabled for the current privilege level; the
/// physical address substitutes the window's physical segment.
fn window_hit(dmw: u32, vaddr: u32, plv: PrivilegeLevel) -> Option<u32> {
    let enabled = match plv {
        PrivilegeLevel::Plv0 => dmw & DMW_PLV0 != 0,
        PrivilegeLevel::Plv3 => dmw & DMW_PLV3 != 0,
        // PLV1/PLV2 enable bits are reserved-zero in this core.
        _ => false,
    };
    if !enabled {
        return None;
    }
    if vaddr >> DMW_VSEG_SHIFT != (dmw >> DMW_VSEG_SHIFT) & 0x7 {
        return None;
    }
    Some(((dmw >> DMW_PSEG_SHIFT) & 0x7) << DMW_VSEG_SHIFT | (vaddr & 0x1FFF_FFFF))
}
