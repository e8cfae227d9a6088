//! Pipeline latch structures for inter-stage communication.
//!
//! This module defines the bundle types carried between the five pipeline
//! stages: Fetch → Decode → Execute → Memory → Writeback.
//!
//! 1. **Instruction Flow:** Each bundle carries the instruction word and PC.
//! 2. **Fault Propagation:** A bundle whose `fault` is `Some` is carried
//!    unchanged to commit (first-detected-fault-wins) and every side effect
//!    of the instruction is suppressed.
//! 3. **Intent Fields:** CSR-write, TLB-op, and counter-read intent ride the
//!    bundles so commit can apply them in program order.
//!
//! Each latch holds at most one bundle (`Option<T>` in the CPU); a bundle is
//! owned by the stage that produced it until the consuming stage runs, then
//! discarded.

use crate::common::error::Exception;
use crate::core::pipeline::signals::ControlSignals;

/// Bundle in the IF/ID latch (Fetch to Decode).
///
/// Contains the raw instruction fetched from memory; decode has not yet
/// attached control signals.
#[derive(Clone, Debug)]
pub struct FetchDecode {
    /// Program counter of the instruction.
    pub pc: u32,
    /// 32-bit instruction encoding (zero when the fetch itself faulted).
    pub inst: u32,
    /// Fault detected during fetch, if any.
    pub fault: Option<Exception>,
}

/// Bundle in the ID/EX latch (Decode to Execute).
///
/// Contains the decoded instruction with control signals and the register
/// operands read from the register file.
#[derive(Clone, Debug)]
pub struct DecodeExecute {
    /// Program counter of the instruction.
    pub pc: u32,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Control signals for downstream stages.
    pub ctrl: ControlSignals,
    /// Destination register index.
    pub rd: usize,
    /// Value read from the rj source register.
    pub rj_val: u32,
    /// Value read from the rk source register.
    pub rk_val: u32,
    /// Value read from the rd register when it doubles as a source
    /// (CSRWR/CSRXCHG write data, store data).
    pub rd_val: u32,
    /// Sign-extended immediate.
    pub imm: i32,
    /// CSR number for CSR instructions.
    pub csr_num: u16,
    /// INVTLB selector for the invalidate operation.
    pub invtlb_op: u8,
    /// Fault detected at or before decode, if any.
    pub fault: Option<Exception>,
}

/// Bundle in the EX/MEM latch (Execute to Memory).
///
/// Contains the computed data address and the resolved CSR-write intent.
#[derive(Clone, Debug)]
pub struct ExecuteMemory {
    /// Program counter of the instruction.
    pub pc: u32,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Control signals for downstream stages.
    pub ctrl: ControlSignals,
    /// Destination register index.
    pub rd: usize,
    /// ALU result for simple datapath ops.
    pub alu: u32,
    /// Data virtual address (loads/stores), or the INVTLB address operand.
    pub vaddr: u32,
    /// Store data, or the INVTLB ASID operand in its low bits.
    pub store_data: u32,
    /// CSR number the instruction reads/writes.
    pub csr_num: u16,
    /// Resolved CSR write mask (all-ones for CSRWR, rj for CSRXCHG).
    pub csr_wmask: u32,
    /// Resolved CSR write value.
    pub csr_wvalue: u32,
    /// INVTLB selector.
    pub invtlb_op: u8,
    /// Fault detected at or before execute, if any.
    pub fault: Option<Exception>,
}

/// Bundle in the MEM/WB latch (Memory to Writeback).
///
/// Contains the final result value and the CSR-write intent for commit.
#[derive(Clone, Debug)]
pub struct MemoryWriteback {
    /// Program counter of the instruction.
    pub pc: u32,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Control signals for the writeback stage.
    pub ctrl: ControlSignals,
    /// Destination register index.
    pub rd: usize,
    /// Result value: load data or ALU result.
    pub result: u32,
    /// Data virtual address carried for BADV on memory faults.
    pub vaddr: u32,
    /// CSR number the instruction reads/writes.
    pub csr_num: u16,
    /// Resolved CSR write mask.
    pub csr_wmask: u32,
    /// Resolved CSR write value.
    pub csr_wvalue: u32,
    /// INVTLB selector, carried for the wire image.
    pub invtlb_op: u8,
    /// Fault detected in any stage, if any.
    pub fault: Option<Exception>,
}
