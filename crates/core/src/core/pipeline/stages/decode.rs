//! Instruction Decode (ID) Stage.
//!
//! Second stage of the pipeline: consults the decoder collaborator, checks
//! instruction privilege, detects hazards, and reads register operands. An
//! undecodable encoding becomes INE; a privileged encoding at PLV3 becomes
//! IPE. Faults from Fetch pass through untouched (first fault wins).

use crate::common::error::Exception;
use crate::core::arch::mode::PrivilegeLevel;
use crate::core::pipeline::hazards::{need_stall_raw, need_stall_serialize};
use crate::core::pipeline::latches::DecodeExecute;
use crate::core::pipeline::signals::ControlSignals;
use crate::isa::decode::DecodedInst;
use crate::core::Cpu;

/// Executes the decode stage.
///
/// Returns `true` when Decode stalled this cycle: the IF/ID bundle stays
/// put, a bubble enters ID/EX, and Fetch holds.
pub fn decode_stage(cpu: &mut Cpu) -> bool {
    let Some(fd) = cpu.if_id.as_ref() else {
        cpu.id_ex = None;
        return false;
    };

    // A bundle that faulted in Fetch carries no decodable instruction;
    // pass it through with no-op control signals and no operand reads.
    if fd.fault.is_some() {
        let fd = cpu.if_id.take().map(|b| bubble_with(b.pc, b.inst, b.fault));
        cpu.id_ex = fd;
        return false;
    }

    let (pc, inst) = (fd.pc, fd.inst);
    let (decoded, fault) = match cpu.decoder.decode(inst) {
        None => (DecodedInst::default(), Some(Exception::InstructionNotExist(inst))),
        Some(dec) => {
            if dec.ctrl.privileged && cpu.csrs.plv() != PrivilegeLevel::Plv0 {
                (DecodedInst::default(), Some(Exception::PrivilegeError))
            } else {
                (dec, None)
            }
        }
    };

    if fault.is_none()
        && (need_stall_raw(&decoded, cpu.ex_mem.as_ref(), cpu.mem_wb.as_ref())
            || need_stall_serialize(&decoded, cpu.ex_mem.as_ref(), cpu.mem_wb.as_ref()))
    {
        if decoded.ctrl.serializes() {
            cpu.stats.stalls_serialize += 1;
        } else {
            cpu.stats.stalls_data += 1;
        }
        cpu.id_ex = None;
        return true;
    }

    tracing::trace!(
        pc = format_args!("{:#010x}", pc),
        inst = format_args!("{:#010x}", inst),
        "ID"
    );

    cpu.if_id = None;
    cpu.id_ex = Some(DecodeExecute {
        pc,
        inst,
        ctrl: decoded.ctrl,
        rd: decoded.rd,
        rj_val: cpu.regs.read(decoded.rj),
        rk_val: cpu.regs.read(decoded.rk),
        rd_val: cpu.regs.read(decoded.rd),
        imm: decoded.imm,
        csr_num: decoded.csr_num,
        invtlb_op: decoded.invtlb_op,
        fault,
    });
    false
}

fn bubble_with(pc: u32, inst: u32, fault: Option<Exception>) -> DecodeExecute {
    DecodeExecute {
        pc,
        inst,
        ctrl: ControlSignals::default(),
        rd: 0,
        rj_val: 0,
        rk_val: 0,
        rd_val: 0,
        imm: 0,
        csr_num: 0,
        invtlb_op: 0,
        fault,
    }
}
