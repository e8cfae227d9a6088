//! # CSR access tests
//!
//! Verifies masked read/write semantics of the CSR file: legal field
//! restriction, write-ignored reserved bits, read-as-zero unmapped numbers,
//! and the special-cased registers (ESTAT, TVAL, TICLR, ASID).

use lasim_core::core::arch::csr::{self, CsrFile};
use rstest::rstest;

/// After reset the core is in direct address mode at PLV0 with interrupts off.
#[test]
fn csr_reset_state() {
    let csrs = CsrFile::new();
    assert_eq!(csrs.crmd, csr::CRMD_DA);
    assert_eq!(csrs.read(csr::CSR_CRMD), 0x8);
    assert_eq!(csrs.prmd, 0);
    assert_eq!(csrs.estat, 0);
    assert_eq!(csrs.tval, 0);
}

/// A masked write changes only the masked bit positions; unmasked bits keep
/// their prior value.
#[test]
fn csr_write_respects_mask() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_ERA, u32::MAX, 0xAAAA_AAAA);
    csrs.write(csr::CSR_ERA, 0x0000_FFFF, 0x5555_5555);
    assert_eq!(csrs.read(csr::CSR_ERA), 0xAAAA_5555);
}

/// Full-width scratch registers store and return every bit.
#[rstest]
#[case(csr::CSR_SAVE0)]
#[case(csr::CSR_SAVE1)]
#[case(csr::CSR_SAVE2)]
#[case(csr::CSR_SAVE3)]
#[case(csr::CSR_ERA)]
#[case(csr::CSR_BADV)]
#[case(csr::CSR_TID)]
fn csr_full_width_registers(#[case] num: u16) {
    let mut csrs = CsrFile::new();
    csrs.write(num, u32::MAX, 0xDEAD_BEEF);
    assert_eq!(csrs.read(num), 0xDEAD_BEEF);
}

/// CRMD only implements bits 8:0; the rest are write-ignored and read zero.
#[test]
fn csr_crmd_legal_field_range() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_CRMD, u32::MAX, u32::MAX);
    assert_eq!(csrs.read(csr::CSR_CRMD), 0x1FF);
}

/// PRMD only implements PPLV and PIE.
#[test]
fn csr_prmd_legal_field_range() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_PRMD, u32::MAX, u32::MAX);
    assert_eq!(csrs.read(csr::CSR_PRMD), 0x7);
}

/// Only the two software interrupt bits of ESTAT are writable.
#[test]
fn csr_estat_software_bits_only() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_ESTAT, u32::MAX, u32::MAX);
    assert_eq!(csrs.read(csr::CSR_ESTAT), 0x3);
    csrs.write(csr::CSR_ESTAT, u32::MAX, 0);
    assert_eq!(csrs.read(csr::CSR_ESTAT), 0);
}

/// Entry address registers implement bits 31:6 only, so handlers are
/// 64-byte aligned.
#[rstest]
#[case(csr::CSR_EENTRY)]
#[case(csr::CSR_TLBRENTRY)]
fn csr_entry_registers_aligned(#[case] num: u16) {
    let mut csrs = CsrFile::new();
    csrs.write(num, u32::MAX, 0xFFFF_FFFF);
    assert_eq!(csrs.read(num), 0xFFFF_FFC0);
}

/// TVAL is read-only; writes are silently dropped.
#[test]
fn csr_tval_read_only() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_TVAL, u32::MAX, 0x1234);
    assert_eq!(csrs.read(csr::CSR_TVAL), 0);
}

/// TICLR always reads zero, even right after a clearing write.
#[test]
fn csr_ticlr_reads_zero() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_TICLR, u32::MAX, 1);
    assert_eq!(csrs.read(csr::CSR_TICLR), 0);
}

/// The ASID register carries a read-only ASIDBITS field of 10.
#[test]
fn csr_asid_asidbits_read_only() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_ASID, u32::MAX, u32::MAX);
    assert_eq!(csrs.read(csr::CSR_ASID), 0x3FF | 10 << 16);
    assert_eq!(csrs.asid_value(), 0x3FF);
}

/// DMW registers implement only the PLV-enable, MAT, PSEG, and VSEG fields.
#[test]
fn csr_dmw_legal_field_range() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_DMW0, u32::MAX, u32::MAX);
    assert_eq!(csrs.read(csr::CSR_DMW0), 0xEE00_0039);
}

/// TLBELO bit 7 is reserved-zero.
#[test]
fn csr_tlbelo_reserved_bit() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_TLBELO0, u32::MAX, u32::MAX);
    assert_eq!(csrs.read(csr::CSR_TLBELO0) & 0x80, 0);
}

/// Unmapped CSR numbers read zero and drop writes without faulting.
#[test]
fn csr_unmapped_numbers() {
    let mut csrs = CsrFile::new();
    csrs.write(999, u32::MAX, 0x1234_5678);
    assert_eq!(csrs.read(999), 0);
}

/// ECFG implements the 13 local interrupt enable bits.
#[test]
fn csr_ecfg_lie_field() {
    let mut csrs = CsrFile::new();
    csrs.write(csr::CSR_ECFG, u32::MAX, u32::MAX);
    assert_eq!(csrs.read(csr::CSR_ECFG), 0x1FFF);
}
