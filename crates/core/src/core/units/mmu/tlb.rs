//! Translation Lookaside Buffer (TLB).
//!
//! A fixed-capacity, fully associative store of virtual-to-physical page
//! mappings. Each entry covers a pair of pages (even/odd) sharing one
//! virtual page-pair number, matching the CAM organization of the hardware,
//! including the advisory multiple-match condition. It provides:
//! 1. **Search:** Associative lookup by address and ASID with global-bit bypass.
//! 2. **Maintenance:** Indexed read/write, replacement-driven fill, and the
//!    INVTLB selector family.
//! 3. **CSR Staging:** Conversion between entries and the TLBEHI/TLBELO/TLBIDX
//!    staging registers.

use crate::common::addr::{PAGE_SHIFT, VPPN_SHIFT};
use crate::core::arch::csr::{
    CsrFile, TLBELO_D, TLBELO_G, TLBELO_MAT_MASK, TLBELO_MAT_SHIFT, TLBELO_PLV_MASK,
    TLBELO_PLV_SHIFT, TLBELO_PPN_SHIFT, TLBELO_V, TLBEHI_VPPN, TLBIDX_NE, TLBIDX_PS_MASK,
    TLBIDX_PS_SHIFT,
};

/// INVTLB selector: invalidate every entry.
pub const INVTLB_ALL: u8 = 0;
/// INVTLB selector: invalidate every entry (alternate encoding).
pub const INVTLB_ALL_ALT: u8 = 1;
/// INVTLB selector: invalidate entries with the global bit set.
pub const INVTLB_GLOBAL: u8 = 2;
/// INVTLB selector: invalidate entries with the global bit clear.
pub const INVTLB_NON_GLOBAL: u8 = 3;
/// INVTLB selector: invalidate non-global entries matching the ASID.
pub const INVTLB_NON_GLOBAL_ASID: u8 = 4;
/// INVTLB selector: invalidate non-global entries matching ASID and address.
pub const INVTLB_NON_GLOBAL_ASID_VA: u8 = 5;
/// INVTLB selector: invalidate entries matching the address that are global
/// or match the ASID.
pub const INVTLB_GLOBAL_OR_ASID_VA: u8 = 6;
/// Highest defined INVTLB selector; larger values are reserved.
pub const INVTLB_OP_MAX: u8 = INVTLB_GLOBAL_OR_ASID_VA;

/// Page size exponent of a 4 KiB page.
pub const PS_4K: u32 = 12;
/// Page size exponent of a 4 MiB page.
pub const PS_4M: u32 = 22;

/// One physical page translation held in a TLB entry slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TlbPage {
    /// Page valid bit; invalid pages fault with PIL/PIS/PIF.
    pub valid: bool,
    /// Dirty bit; stores to clean pages fault with PME.
    pub dirty: bool,
    /// Lowest privilege level allowed to access the page.
    pub plv: u8,
    /// Memory access type of the page.
    pub mat: u8,
    /// Physical page number.
    pub ppn: u32,
}

impl TlbPage {
    /// Builds a page from a TLBELO register image.
    pub fn from_tlbelo(val: u32) -> Self {
        Self {
            valid: val & TLBELO_V != 0,
            dirty: val & TLBELO_D != 0,
            plv: ((val >> TLBELO_PLV_SHIFT) & TLBELO_PLV_MASK) as u8,
            mat: ((val >> TLBELO_MAT_SHIFT) & TLBELO_MAT_MASK) as u8,
            ppn: val >> TLBELO_PPN_SHIFT,
        }
    }

    /// Packs the page into a TLBELO register image (without the G bit, which
    /// lives per entry).
    pub fn to_tlbelo(self) -> u32 {
        u32::from(self.valid)
            | u32::from(self.dirty) << 1
            | u32::from(self.plv & TLBELO_PLV_MASK as u8) << TLBELO_PLV_SHIFT
            | u32::from(self.mat & TLBELO_MAT_MASK as u8) << TLBELO_MAT_SHIFT
            | self.ppn << TLBELO_PPN_SHIFT
    }
}

/// A single TLB entry: one virtual page-pair number mapping two pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TlbEntry {
    /// Virtual page-pair number (address bits 31:13).
    pub vppn: u32,
    /// Page size exponent (12 for 4 KiB, 22 for 4 MiB).
    pub ps: u32,
    /// Address space identifier the entry belongs to.
    pub asid: u16,
    /// Global bit; global entries match regardless of ASID.
    pub global: bool,
    /// Entry existence bit; cleared slots never match.
    pub exists: bool,
    /// Even and odd page translations.
    pub pages: [TlbPage; 2],
}

impl TlbEntry {
    /// Builds an entry from the CSR staging registers
    /// (TLBEHI/TLBELO0/TLBELO1/TLBIDX/ASID).
    ///
    /// The G bit is the AND of both TLBELO images, as written by hardware.
    /// `exists` is left for the caller, which knows whether the write is a
    /// refill-handler store (forced valid) or a plain TLBWR.
    pub fn from_csrs(csrs: &CsrFile) -> Self {
        Self {
            vppn: (csrs.tlbehi & TLBEHI_VPPN) >> VPPN_SHIFT,
            ps: csrs.tlbidx_ps(),
            asid: csrs.asid_value(),
            global: csrs.tlbelo0 & TLBELO_G != 0 && csrs.tlbelo1 & TLBELO_G != 0,
            exists: true,
            pages: [
                TlbPage::from_tlbelo(csrs.tlbelo0),
                TlbPage::from_tlbelo(csrs.tlbelo1),
            ],
        }
    }

    /// Writes the entry back into the CSR staging registers (TLBRD path).
    pub fn to_csrs(self, csrs: &mut CsrFile) {
        let g = if self.global { TLBELO_G } else { 0 };
        csrs.tlbehi = self.vppn << VPPN_SHIFT;
        csrs.tlbelo0 = self.pages[0].to_tlbelo() | g;
        csrs.tlbelo1 = self.pages[1].to_tlbelo() | g;
        csrs.tlbidx = (csrs.tlbidx & !(TLBIDX_PS_MASK << TLBIDX_PS_SHIFT) & !TLBIDX_NE)
            | (self.ps & TLBIDX_PS_MASK) << TLBIDX_PS_SHIFT;
    }

    /// Whether this entry translates `vaddr` under `asid`.
    ///
    /// The comparison ignores the low VPPN bits covered by pages larger than
    /// 4 KiB; the ASID comparison is bypassed for global entries.
    pub fn matches(&self, vaddr: u32, asid: u16) -> bool {
        if !self.exists {
            return false;
        }
        if !self.global && self.asid != asid {
            return false;
        }
        let shift = self.ps.saturating_sub(PS_4K);
        (vaddr >> VPPN_SHIFT) >> shift == self.vppn >> shift
    }

    /// Selects the even or odd page for `vaddr` (bit `ps` of the address).
    pub fn page_for(&self, vaddr: u32) -> TlbPage {
        self.pages[((vaddr >> self.ps) & 1) as usize]
    }
}

/// A successful TLB search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TlbHit {
    /// Index of the matching entry (lowest on multiple match).
    pub index: usize,
    /// Page size exponent of the matching entry.
    pub ps: u32,
    /// The selected even/odd page translation.
    pub page: TlbPage,
    /// Advisory flag: more than one entry matched.
    ///
    /// This violates the uniqueness invariant and is surfaced to the caller
    /// rather than silently dropped; it is not a trap.
    pub multiple_match: bool,
}

/// Translation Lookaside Buffer.
///
/// Mutated only by the single committing instruction in the Memory stage,
/// so no intra-cycle ordering issues arise inside the store itself.
#[derive(Clone, Debug)]
pub struct Tlb {
    entries: Vec<TlbEntry>,
    /// Round-robin victim cursor for TLBFILL.
    next_fill: usize,
}

impl Tlb {
    /// Creates a TLB with `capacity` cleared entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![TlbEntry::default(); capacity],
            next_fill: 0,
        }
    }

    /// Number of entry slots.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Associatively searches for a translation of `vaddr` under `asid`.
    ///
    /// Returns the lowest-index match; if further entries also match, the
    /// hit carries the advisory `multiple_match` flag.
    pub fn search(&self, vaddr: u32, asid: u16) -> Option<TlbHit> {
        let mut hit: Option<TlbHit> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.matches(vaddr, asid) {
                continue;
            }
            match hit {
                None => {
                    hit = Some(TlbHit {
                        index,
                        ps: entry.ps,
                        page: entry.page_for(vaddr),
                        multiple_match: false,
                    });
                }
                Some(ref mut h) => {
                    h.multiple_match = true;
                    tracing::warn!(
                        first = h.index,
                        also = index,
                        vaddr = format_args!("{:#010x}", vaddr),
                        "TLB multiple match"
                    );
                }
            }
        }
        hit
    }

    /// Reads the entry at `index`; `None` when the slot has never been
    /// written or was invalidated (the TLBRD path reports NE=1).
    pub fn read(&self, index: usize) -> Option<TlbEntry> {
        self.entries
            .get(index)
            .copied()
            .filter(|entry| entry.exists)
    }

    /// Unconditionally overwrites the slot at `index` (TLBWR path).
    pub fn write(&mut self, index: usize, entry: TlbEntry) {
        if let Some(slot) = self.entries.get_mut(index) {
            *slot = entry;
        }
    }

    /// Writes `entry` into the round-robin victim slot (TLBFILL path) and
    /// returns the chosen index.
    pub fn fill(&mut self, entry: TlbEntry) -> usize {
        let index = self.next_fill;
        self.next_fill = (self.next_fill + 1) % self.entries.len();
        self.entries[index] = entry;
        index
    }

    /// Applies an INVTLB selector.
    ///
    /// `asid` and `vaddr` are the register operands of the instruction; they
    /// are ignored by selectors that do not use them. Entries pinned by the
    /// global bit survive every selector that excludes global entries.
    /// Reserved selectors (above [`INVTLB_OP_MAX`]) are refused at decode,
    /// so this method only sees defined values.
    pub fn invalidate(&mut self, op: u8, asid: u16, vaddr: u32) {
        let va_match = |entry: &TlbEntry| {
            let shift = entry.ps.saturating_sub(PS_4K);
            (vaddr >> VPPN_SHIFT) >> shift == entry.vppn >> shift
        };
        for entry in &mut self.entries {
            if !entry.exists {
                continue;
            }
            let selected = match op {
                INVTLB_ALL | INVTLB_ALL_ALT => true,
                INVTLB_GLOBAL => entry.global,
                INVTLB_NON_GLOBAL => !entry.global,
                INVTLB_NON_GLOBAL_ASID => !entry.global && entry.asid == asid,
                INVTLB_NON_GLOBAL_ASID_VA => {
                    !entry.global && entry.asid == asid && va_match(entry)
                }
                INVTLB_GLOBAL_OR_ASID_VA => {
                    (entry.global || entry.asid == asid) && va_match(entry)
                }
                _ => false,
            };
            if selected {
                entry.exists = false;
            }
        }
    }
}

/// Bit offset re-export used by entry packing; pages are 4 KiB-granular.
const _: () = assert!(PAGE_SHIFT == PS_4K);
