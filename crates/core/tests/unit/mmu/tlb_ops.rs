//! # TLB operation tests
//!
//! Verifies the associative store directly: search, indexed read/write,
//! round-robin fill, the INVTLB selector family, and the advisory
//! multiple-match condition.

use lasim_core::core::units::mmu::tlb::{
    Tlb, TlbEntry, TlbPage, INVTLB_ALL, INVTLB_GLOBAL, INVTLB_GLOBAL_OR_ASID_VA,
    INVTLB_NON_GLOBAL, INVTLB_NON_GLOBAL_ASID, INVTLB_NON_GLOBAL_ASID_VA, PS_4K, PS_4M,
};
use rstest::rstest;

fn entry(vaddr: u32, asid: u16, global: bool) -> TlbEntry {
    TlbEntry {
        vppn: vaddr >> 13,
        ps: PS_4K,
        asid,
        global,
        exists: true,
        pages: [
            TlbPage {
                valid: true,
                dirty: true,
                plv: 3,
                mat: 1,
                ppn: 0x100,
            },
            TlbPage {
                valid: true,
                dirty: true,
                plv: 3,
                mat: 1,
                ppn: 0x101,
            },
        ],
    }
}

/// A written entry is found by a search with the same address and ASID.
#[test]
fn write_then_search_hits() {
    let mut tlb = Tlb::new(16);
    tlb.write(3, entry(0x2000_0000, 7, false));

    let hit = tlb.search(0x2000_0000, 7).expect("entry should match");
    assert_eq!(hit.index, 3);
    assert_eq!(hit.page.ppn, 0x100);
}

/// The even/odd page is selected by the address bit just below the VPPN.
#[test]
fn search_selects_odd_page() {
    let mut tlb = Tlb::new(16);
    tlb.write(0, entry(0x2000_0000, 7, false));
    let hit = tlb.search(0x2000_1000, 7).expect("odd page of the same pair");
    assert_eq!(hit.page.ppn, 0x101);
}

/// A non-global entry does not match a different ASID; a global entry does.
#[test]
fn asid_matching_and_global_bypass() {
    let mut tlb = Tlb::new(16);
    tlb.write(0, entry(0x2000_0000, 7, false));
    tlb.write(1, entry(0x4000_0000, 7, true));

    assert!(tlb.search(0x2000_0000, 8).is_none());
    assert!(tlb.search(0x4000_0000, 8).is_some());
}

/// 4 MiB entries compare only the VPPN bits above the page size.
#[test]
fn large_page_match() {
    let mut tlb = Tlb::new(16);
    let mut e = entry(0x2000_0000, 7, false);
    e.ps = PS_4M;
    tlb.write(0, e);

    assert!(tlb.search(0x2020_0000, 7).is_some(), "within the 4 MiB pair");
    assert!(tlb.search(0x2080_0000, 7).is_none(), "outside the pair");
}

/// Reading an empty slot reports no entry.
#[test]
fn read_empty_slot() {
    let tlb = Tlb::new(16);
    assert!(tlb.read(5).is_none());
}

/// Reading a written slot returns the entry verbatim.
#[test]
fn read_written_slot() {
    let mut tlb = Tlb::new(16);
    let e = entry(0x2000_0000, 7, false);
    tlb.write(5, e);
    assert_eq!(tlb.read(5), Some(e));
}

/// FILL walks the victim cursor round-robin across the capacity.
#[test]
fn fill_round_robin() {
    let mut tlb = Tlb::new(4);
    assert_eq!(tlb.capacity(), 4);
    let mut indices = Vec::new();
    for i in 0..5 {
        indices.push(tlb.fill(entry(0x1000_0000 + (i << 13), i as u16, false)));
    }
    assert_eq!(indices, vec![0, 1, 2, 3, 0]);
}

/// Invalidate-all leaves nothing searchable.
#[test]
fn invalidate_all_then_search_misses() {
    let mut tlb = Tlb::new(16);
    tlb.write(0, entry(0x2000_0000, 7, false));
    tlb.write(1, entry(0x4000_0000, 7, true));

    tlb.invalidate(INVTLB_ALL, 0, 0);

    assert!(tlb.search(0x2000_0000, 7).is_none());
    assert!(tlb.search(0x4000_0000, 7).is_none());
}

/// Selector semantics: which of {global, non-global matching, non-global
/// other-ASID} survive each op.
#[rstest]
#[case(INVTLB_GLOBAL, false, true, true)]
#[case(INVTLB_NON_GLOBAL, true, false, false)]
#[case(INVTLB_NON_GLOBAL_ASID, true, false, true)]
#[case(INVTLB_NON_GLOBAL_ASID_VA, true, false, true)]
#[case(INVTLB_GLOBAL_OR_ASID_VA, false, false, true)]
fn invalidate_selector_semantics(
    #[case] op: u8,
    #[case] global_survives: bool,
    #[case] matching_survives: bool,
    #[case] other_asid_survives: bool,
) {
    let mut tlb = Tlb::new(16);
    let va = 0x2000_0000;
    tlb.write(0, entry(va, 7, true));
    tlb.write(1, entry(va, 7, false));
    tlb.write(2, entry(va, 9, false));

    tlb.invalidate(op, 7, va);

    assert_eq!(tlb.read(0).is_some(), global_survives, "global entry");
    assert_eq!(tlb.read(1).is_some(), matching_survives, "asid 7 entry");
    assert_eq!(tlb.read(2).is_some(), other_asid_survives, "asid 9 entry");
}

/// Address-qualified selectors leave entries for other addresses alone.
#[test]
fn invalidate_by_address_spares_other_pages() {
    let mut tlb = Tlb::new(16);
    tlb.write(0, entry(0x2000_0000, 7, false));
    tlb.write(1, entry(0x3000_0000, 7, false));

    tlb.invalidate(INVTLB_NON_GLOBAL_ASID_VA, 7, 0x2000_0000);

    assert!(tlb.read(0).is_none());
    assert!(tlb.read(1).is_some());
}

/// Two entries matching the same address is advisory: lowest index wins and
/// the hit is flagged.
#[test]
fn multiple_match_is_flagged_lowest_wins() {
    let mut tlb = Tlb::new(16);
    tlb.write(2, entry(0x2000_0000, 7, false));
    tlb.write(9, entry(0x2000_0000, 7, false));

    let hit = tlb.search(0x2000_0000, 7).expect("both match");
    assert_eq!(hit.index, 2);
    assert!(hit.multiple_match);
}
