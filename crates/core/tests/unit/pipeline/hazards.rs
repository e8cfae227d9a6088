//! # Hazard tests
//!
//! Verifies that RAW stalls and CSR/TLB serialization keep results
//! architecturally correct without a forwarding network, end to end.

use crate::common::harness::TestContext;
use crate::common::inst::{addi_w, csrrd, csrwr, ld_w, nop, st_w};
use lasim_core::core::arch::csr::CSR_SAVE0;

/// Back-to-back dependent ALU ops observe each other's results through the
/// stall logic.
#[test]
fn raw_dependency_resolves_by_stalling() {
    let mut ctx = TestContext::new().load_program(
        0,
        &[
            addi_w(1, 0, 5),  // r1 = 5
            addi_w(2, 1, 3),  // r2 = r1 + 3
            addi_w(3, 2, -1), // r3 = r2 - 1
        ],
    );
    ctx.run_until_retired(3);
    assert_eq!(ctx.get_reg(1), 5);
    assert_eq!(ctx.get_reg(2), 8);
    assert_eq!(ctx.get_reg(3), 7);
    assert!(ctx.cpu.stats.stalls_data > 0, "the pipeline had to stall");
    assert!(ctx.cpu.stats.cpi() > 1.0, "stalls show up in CPI");
}

/// A load feeding a store round-trips through memory correctly.
#[test]
fn load_use_store_chain() {
    let mut ctx = TestContext::new().load_program(
        0,
        &[
            addi_w(1, 0, 0x100),   // r1 = &src
            ld_w(2, 1, 0),         // r2 = mem[0x100]
            st_w(2, 1, 4),         // mem[0x104] = r2
        ],
    );
    ctx.poke_word(0x100, 0xCAFE_F00D);
    ctx.run_until_retired(3);
    assert_eq!(ctx.peek_word(0x104), 0xCAFE_F00D);
}

/// A CSR read right after a CSR write observes the committed value
/// (serialization, not forwarding).
#[test]
fn csr_write_then_read_serializes() {
    let mut ctx = TestContext::new().load_program(
        0,
        &[
            csrwr(1, CSR_SAVE0), // SAVE0 = r1, r1 = old SAVE0
            csrrd(2, CSR_SAVE0), // r2 = SAVE0
        ],
    );
    ctx.set_reg(1, 0x1357_9BDF);
    ctx.run_until_retired(2);
    assert_eq!(ctx.get_reg(2), 0x1357_9BDF);
    assert_eq!(ctx.get_reg(1), 0, "CSRWR returns the pre-write value");
    assert!(ctx.cpu.stats.stalls_serialize > 0);
}

/// Serialization does not deadlock an otherwise idle pipeline.
#[test]
fn serialized_instruction_drains_and_proceeds() {
    let mut ctx = TestContext::new().load_program(
        0,
        &[
            nop(),
            csrwr(1, CSR_SAVE0),
            nop(),
            addi_w(3, 0, 9),
        ],
    );
    ctx.set_reg(1, 1);
    ctx.run_until_retired(4);
    assert_eq!(ctx.get_reg(3), 9);
}
