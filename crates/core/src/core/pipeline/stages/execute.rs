//! Execute (EX) Stage.
//!
//! Third stage of the pipeline: computes data addresses and the minimal ALU
//! results, resolves CSR write masks and values, and contributes the
//! Execute-stage exception candidates (ALE for misaligned accesses, SYS and
//! BRK for the explicit traps). A bundle that already carries a fault passes
//! through with all detection suppressed.

use crate::common::error::Exception;
use crate::core::pipeline::latches::ExecuteMemory;
use crate::core::pipeline::signals::AluOp;
use crate::core::Cpu;

/// Executes the execute stage.
pub fn execute_stage(cpu: &mut Cpu) {
    let Some(ex) = cpu.id_ex.take() else {
        cpu.ex_mem = None;
        return;
    };

    let mut fault = ex.fault;
    let mut vaddr = 0;
    let mut store_data = 0;
    let alu = match ex.ctrl.alu_op {
        AluOp::Add => ex.rj_val.wrapping_add(ex.imm as u32),
        AluOp::And => ex.rj_val & ex.imm as u32,
    };

    if fault.is_none() {
        if ex.ctrl.is_syscall {
            fault = Some(Exception::Syscall);
        } else if ex.ctrl.is_break {
            fault = Some(Exception::Breakpoint);
        } else if ex.ctrl.mem_read || ex.ctrl.mem_write {
            vaddr = ex.rj_val.wrapping_add(ex.imm as u32);
            store_data = ex.rd_val;
            if vaddr & ex.ctrl.mem_width.align_mask() != 0 {
                fault = Some(Exception::AddressUnaligned(vaddr));
            }
        } else if ex.ctrl.tlb_op == crate::core::pipeline::signals::TlbOp::Invalidate {
            // INVTLB operands: rj carries the ASID, rk the virtual address.
            vaddr = ex.rk_val;
            store_data = ex.rj_val;
        }
    }

    // CSRWR writes all bits; CSRXCHG writes under the rj mask.
    let csr_wmask = if ex.ctrl.csr_use_mask { ex.rj_val } else { u32::MAX };
    let csr_wvalue = ex.rd_val;

    if let Some(ref e) = fault {
        tracing::trace!(pc = format_args!("{:#010x}", ex.pc), %e, "EX fault");
    }

    cpu.ex_mem = Some(ExecuteMemory {
        pc: ex.pc,
        inst: ex.inst,
        ctrl: ex.ctrl,
        rd: ex.rd,
        alu,
        vaddr,
        store_data,
        csr_num: ex.csr_num,
        csr_wmask,
        csr_wvalue,
        invtlb_op: ex.invtlb_op,
        fault,
    });
}
