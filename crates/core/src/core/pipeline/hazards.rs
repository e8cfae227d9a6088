//! Hazard detection.
//!
//! This module implements the stall conditions that keep the in-order
//! pipeline architecturally consistent. It provides:
//! 1. **RAW Detection:** Stalls Decode while a source register has a pending
//!    write in flight (no forwarding network; the register file is written
//!    only at commit).
//! 2. **Serialization:** Stalls CSR-touching, TLB-touching, and ERTN
//!    instructions until the pipeline drains, and stalls anything behind
//!    such an instruction — at most one CSR/TLB writer is in flight past
//!    Decode at any time.
//!
//! Stalls are evaluated after Writeback/Memory/Execute have run for the
//! cycle, so only the EX/MEM and MEM/WB latches can hold in-flight
//! instructions at that point.

use crate::core::pipeline::latches::{ExecuteMemory, MemoryWriteback};
use crate::isa::decode::DecodedInst;

/// Whether the instruction in Decode must stall for a read-after-write
/// hazard against an in-flight register writer.
pub fn need_stall_raw(
    dec: &DecodedInst,
    ex_mem: Option<&ExecuteMemory>,
    mem_wb: Option<&MemoryWriteback>,
) -> bool {
    let pending = |rd: usize| {
        rd != 0
            && ((dec.reads_rj && dec.rj == rd)
                || (dec.reads_rk && dec.rk == rd)
                || (dec.reads_rd && dec.rd == rd))
    };

    if let Some(ex) = ex_mem {
        if ex.fault.is_none() && ex.ctrl.reg_write && pending(ex.rd) {
            return true;
        }
    }
    if let Some(wb) = mem_wb {
        if wb.fault.is_none() && wb.ctrl.reg_write && pending(wb.rd) {
            return true;
        }
    }
    false
}

/// Whether the instruction in Decode must stall for CSR/TLB serialization.
///
/// A serializing instruction (CSR access, TLB op, ERTN) waits until the
/// downstream latches are empty so it travels alone; any instruction waits
/// while a serializing one is still in flight, so it observes the committed
/// CSR/TLB state.
pub fn need_stall_serialize(
    dec: &DecodedInst,
    ex_mem: Option<&ExecuteMemory>,
    mem_wb: Option<&MemoryWriteback>,
) -> bool {
    let downstream_busy = ex_mem.is_some() || mem_wb.is_some();
    if dec.ctrl.serializes() && downstream_busy {
        return true;
    }
    let serializing_in_flight = ex_mem.is_some_and(|b| b.ctrl.serializes())
        || mem_wb.is_some_and(|b| b.ctrl.serializes());
    serializing_in_flight
}
