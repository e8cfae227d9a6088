//! # Commit behavior tests
//!
//! End-to-end scenarios through the whole pipeline: exception vectoring,
//! exception return, side-effect suppression, interrupt priority, counter
//! reads, and TLB-driven faults.

use crate::common::harness::{TestContext, TEST_EENTRY, TEST_TLBRENTRY};
use crate::common::inst::{
    addi_w, csrrd, csrwr, ertn, invtlb, ld_w, nop, rdcntid, rdcntvh, rdcntvl, st_w, syscall,
    tlbsrch, tlbwr,
};
use lasim_core::common::error::{
    ECODE_ADE, ECODE_ALE, ECODE_INE, ECODE_INT, ECODE_IPE, ECODE_SYS, ECODE_TLBR,
};
use lasim_core::core::arch::csr::{
    self, CSR_CRMD, CSR_DMW0, CSR_SAVE0,
};
use lasim_core::Cpu;

fn run_until(cpu: &mut Cpu, mut done: impl FnMut(&Cpu) -> bool) {
    for _ in 0..2000 {
        if done(cpu) {
            return;
        }
        cpu.tick();
    }
    panic!("condition not reached within cycle budget");
}

/// SYSCALL at PC 0x100 with EENTRY 0x400: redirect, ERA, Ecode, and the
/// privilege drop all land in the same commit.
#[test]
fn syscall_vectors_to_eentry() {
    let mut ctx = TestContext::new()
        .with_vectors()
        .load_program(0x100, &[syscall(0)]);
    // Start from PLV3 so the drop to PLV0 is observable.
    ctx.cpu.csrs.crmd |= 0x3;

    run_until(&mut ctx.cpu, |cpu| cpu.stats.exceptions_taken == 1);

    assert_eq!(ctx.cpu.pc, TEST_EENTRY, "redirect target");
    assert_eq!(ctx.cpu.csrs.era, 0x100);
    assert_eq!(ctx.cpu.csrs.estat_ecode(), ECODE_SYS);
    assert_eq!(ctx.cpu.csrs.crmd & 0x3, 0, "PLV0 in the handler");
}

/// ERTN immediately after an exception restores CRMD exactly and resumes at
/// the saved ERA.
#[test]
fn ertn_resumes_at_era() {
    let mut ctx = TestContext::new()
        .with_vectors()
        .load_program(0x100, &[syscall(0)]);
    ctx.cpu.csrs.crmd |= csr::CRMD_IE;
    let crmd_before = ctx.cpu.csrs.crmd;
    ctx.poke_word(TEST_EENTRY, ertn());

    run_until(&mut ctx.cpu, |cpu| cpu.stats.ertn_count == 1);

    assert_eq!(ctx.cpu.pc, 0x100, "resume at the faulting instruction");
    assert_eq!(ctx.cpu.csrs.crmd, crmd_before, "CRMD restored exactly");
}

/// A misaligned store raises ALE and leaves memory untouched.
#[test]
fn misaligned_store_suppressed() {
    let mut ctx = TestContext::new().with_vectors().load_program(
        0,
        &[addi_w(1, 0, 0x102), st_w(2, 1, 0)],
    );
    ctx.set_reg(2, 0xDEAD_BEEF);

    run_until(&mut ctx.cpu, |cpu| cpu.stats.exceptions_taken == 1);

    assert_eq!(ctx.cpu.csrs.estat_ecode(), ECODE_ALE);
    assert_eq!(ctx.cpu.csrs.badv, 0x102);
    assert_eq!(ctx.peek_word(0x100), 0, "store never reached memory");
}

/// When an older instruction faults, younger in-flight instructions are
/// flushed before any of their side effects apply.
#[test]
fn fault_flushes_younger_side_effects() {
    let mut ctx = TestContext::new().with_vectors().load_program(
        0,
        &[
            0xFFFF_FFFF, // undecodable
            addi_w(1, 0, 0x7F),
            st_w(2, 3, 0x200),
        ],
    );
    ctx.set_reg(2, 0xBAD0_BAD0);

    run_until(&mut ctx.cpu, |cpu| cpu.stats.exceptions_taken == 1);

    assert_eq!(ctx.cpu.csrs.estat_ecode(), ECODE_INE);
    assert_eq!(ctx.get_reg(1), 0, "younger register write suppressed");
    assert_eq!(ctx.peek_word(0x200), 0, "younger store suppressed");
}

/// A misaligned PC raises the fetch address error with the PC in BADV.
#[test]
fn misaligned_pc_raises_adef() {
    let mut ctx = TestContext::new().with_vectors();
    ctx.cpu.pc = 0x102;

    run_until(&mut ctx.cpu, |cpu| cpu.stats.exceptions_taken == 1);

    assert_eq!(ctx.cpu.csrs.estat_ecode(), ECODE_ADE);
    assert_eq!(ctx.cpu.csrs.badv, 0x102);
    assert_eq!(ctx.cpu.pc, TEST_EENTRY);
}

/// A privileged instruction at PLV3 raises IPE instead of executing.
#[test]
fn privileged_instruction_at_plv3_refused() {
    let mut ctx = TestContext::new()
        .with_vectors()
        .load_program(0x100, &[csrrd(1, CSR_SAVE0)]);
    ctx.cpu.csrs.crmd |= 0x3;
    ctx.cpu.csrs.save[0] = 0x5EC2E7;

    run_until(&mut ctx.cpu, |cpu| cpu.stats.exceptions_taken == 1);

    assert_eq!(ctx.cpu.csrs.estat_ecode(), ECODE_IPE);
    assert_eq!(ctx.get_reg(1), 0, "CSR value never leaked");
}

/// A pending enabled interrupt outranks the committing instruction's own
/// exception and vectors with the interrupt code.
#[test]
fn interrupt_outranks_instruction_exception() {
    let mut ctx = TestContext::new()
        .with_vectors()
        .load_program(0x100, &[syscall(0)]);
    ctx.cpu.csrs.crmd |= csr::CRMD_IE;
    ctx.cpu.csrs.ecfg = 0x1; // software interrupt line 0
    ctx.cpu.csrs.write(csr::CSR_ESTAT, u32::MAX, 0x1);

    run_until(&mut ctx.cpu, |cpu| {
        cpu.stats.interrupts_taken + cpu.stats.exceptions_taken == 1
    });

    assert_eq!(ctx.cpu.stats.interrupts_taken, 1);
    assert_eq!(ctx.cpu.stats.exceptions_taken, 0);
    assert_eq!(ctx.cpu.csrs.estat_ecode(), ECODE_INT);
    assert_eq!(ctx.cpu.csrs.era, 0x100, "the suppressed instruction's PC");
}

/// A masked interrupt does not fire; unmasking it takes it at the next
/// commit.
#[test]
fn masked_interrupt_waits_for_lie() {
    let mut ctx = TestContext::new()
        .with_vectors()
        .load_program(0x100, &[nop(), nop(), nop(), nop()]);
    ctx.cpu.csrs.crmd |= csr::CRMD_IE;
    ctx.cpu.csrs.write(csr::CSR_ESTAT, u32::MAX, 0x1);

    ctx.run_until_retired(2);
    assert_eq!(ctx.cpu.stats.interrupts_taken, 0);

    ctx.cpu.csrs.ecfg = 0x1;
    run_until(&mut ctx.cpu, |cpu| cpu.stats.interrupts_taken == 1);
    assert_eq!(ctx.cpu.csrs.estat_ecode(), ECODE_INT);
}

/// An armed periodic timer eventually interrupts a running program.
#[test]
fn timer_interrupt_end_to_end() {
    let mut ctx = TestContext::new()
        .with_vectors()
        .load_program(0x100, &[nop(); 8]);
    ctx.cpu.csrs.crmd |= csr::CRMD_IE;
    ctx.cpu.csrs.ecfg = csr::ESTAT_IS_TIMER;
    ctx.cpu.csrs.write(
        csr::CSR_TCFG,
        u32::MAX,
        3 << csr::TCFG_INITV_SHIFT | csr::TCFG_PERIOD | csr::TCFG_EN,
    );

    run_until(&mut ctx.cpu, |cpu| cpu.stats.interrupts_taken == 1);
    assert_eq!(ctx.cpu.csrs.estat_ecode(), ECODE_INT);
    assert_eq!(ctx.cpu.pc, TEST_EENTRY);
}

/// Counter reads observe the free-running cycle counter and the TID CSR.
#[test]
fn counter_reads_commit_values() {
    let mut ctx = TestContext::new().load_program(
        0,
        &[rdcntvl(1), rdcntvh(2), rdcntid(3)],
    );
    ctx.cpu.csrs.tid = 0x77;

    ctx.run_until_retired(3);

    let low = ctx.get_reg(1);
    assert!(low > 0 && u64::from(low) <= ctx.cpu.stats.cycles);
    assert_eq!(ctx.get_reg(2), 0, "high word still zero this early");
    assert_eq!(ctx.get_reg(3), 0x77, "RDCNTID reads TID");
}

/// A load to an unmapped address under paged translation vectors to
/// TLBRENTRY, not EENTRY, and flips the core into direct address mode.
#[test]
fn unmapped_load_vectors_to_tlbrentry() {
    let mut ctx = TestContext::new().with_vectors().load_program(
        0,
        &[
            addi_w(1, 0, 1),   // DMW0: vseg 0 -> pseg 0, PLV0
            csrwr(1, CSR_DMW0),
            addi_w(5, 0, 0x300),
            ld_w(4, 5, 0),     // r4 = 0xA000_1000 (poked below)
            addi_w(2, 0, 0x10), // CRMD: PG=1, DA=0
            csrwr(2, CSR_CRMD),
            ld_w(6, 4, 0),     // unmapped under PG
        ],
    );
    ctx.poke_word(0x300, 0xA000_1000);

    run_until(&mut ctx.cpu, |cpu| cpu.stats.exceptions_taken == 1);

    assert_eq!(ctx.cpu.csrs.estat_ecode(), ECODE_TLBR);
    assert_eq!(ctx.cpu.pc, TEST_TLBRENTRY, "refill entry, not EENTRY");
    assert_eq!(ctx.cpu.csrs.badv, 0xA000_1000);
    assert_ne!(
        ctx.cpu.csrs.crmd & csr::CRMD_DA,
        0,
        "refill handler runs untranslated"
    );
    assert_eq!(ctx.cpu.stats.tlb_refills, 1);
    assert_eq!(ctx.get_reg(6), 0, "load result suppressed");
}

/// TLBWR then TLBSRCH through the pipeline: the committed entry is found at
/// the staged index.
#[test]
fn tlbwr_then_tlbsrch_hits() {
    let mut ctx = TestContext::new().load_program(0, &[tlbwr(), tlbsrch()]);
    ctx.cpu.csrs.tlbehi = 0x2000_0000;
    ctx.cpu.csrs.tlbidx = 5 | 12 << csr::TLBIDX_PS_SHIFT;
    ctx.cpu.csrs.tlbelo0 = 0x100 << 8 | 0x13; // PPN 0x100, MAT 1, D, V
    ctx.cpu.csrs.tlbelo1 = 0x101 << 8 | 0x13;

    ctx.run_until_retired(2);

    assert!(ctx.cpu.mmu.tlb.read(5).is_some());
    assert_eq!(ctx.cpu.csrs.tlbidx_index(), 5);
    assert!(!ctx.cpu.csrs.tlbidx_ne());
}

/// INVTLB(all) between write and search turns the hit into NE=1.
#[test]
fn invtlb_all_then_search_misses() {
    let mut ctx = TestContext::new().load_program(0, &[tlbwr(), invtlb(0, 0, 0), tlbsrch()]);
    ctx.cpu.csrs.tlbehi = 0x2000_0000;
    ctx.cpu.csrs.tlbidx = 5 | 12 << csr::TLBIDX_PS_SHIFT;
    ctx.cpu.csrs.tlbelo0 = 0x100 << 8 | 0x13;
    ctx.cpu.csrs.tlbelo1 = 0x101 << 8 | 0x13;

    ctx.run_until_retired(3);

    assert!(ctx.cpu.csrs.tlbidx_ne(), "search after invalidate reports NE");
}

/// Wire snapshots of the latches have the configured widths.
#[test]
fn wire_snapshot_matches_layout() {
    use lasim_core::common::error::StageLink;

    let mut ctx = TestContext::new().load_program(0, &[nop(), nop(), nop(), nop()]);
    ctx.step(3);

    let [if_id, id_ex, ex_mem, mem_wb] = ctx.cpu.wire_snapshot();
    let codec = ctx.cpu.codec;
    assert_eq!(if_id.len(), codec.width_bits(StageLink::FetchDecode).div_ceil(8));
    assert_eq!(id_ex.len(), codec.width_bits(StageLink::DecodeExecute).div_ceil(8));
    assert_eq!(ex_mem.len(), codec.width_bits(StageLink::ExecuteMemory).div_ceil(8));
    assert_eq!(mem_wb.len(), codec.width_bits(StageLink::MemoryWriteback).div_ceil(8));
}
