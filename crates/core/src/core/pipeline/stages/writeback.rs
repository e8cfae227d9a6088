//! Writeback (WB) Stage.
//!
//! Final stage of the pipeline: the single commit point. It samples pending
//! interrupts, vectors exceptions and ERTN through the CSR file, applies CSR
//! writes and counter reads, and retires register results. Returning a
//! redirect target tells pipeline control to flush every younger in-flight
//! bundle and steer fetch.

use crate::common::error::ECODE_INT;
use crate::core::Cpu;

/// Executes the writeback stage.
///
/// Returns the redirect target when an interrupt, exception, or ERTN
/// commits; `None` for ordinary retirement or an empty latch.
pub fn writeback_stage(cpu: &mut Cpu) -> Option<u32> {
    let wb = cpu.mem_wb.take()?;

    // Interrupts are sampled once per cycle here, against the committing
    // instruction. A pending enabled interrupt outranks the instruction's
    // own exception; the instruction is suppressed and re-executed after
    // the handler returns.
    if cpu.csrs.interrupt_pending() {
        let entry = cpu.csrs.raise_exception(ECODE_INT, 0, wb.pc, None);
        cpu.stats.interrupts_taken += 1;
        tracing::debug!(
            era = format_args!("{:#010x}", wb.pc),
            entry = format_args!("{:#010x}", entry),
            "interrupt taken"
        );
        return Some(entry);
    }

    if let Some(ex) = wb.fault {
        let entry = cpu
            .csrs
            .raise_exception(ex.ecode(), ex.esubcode(), wb.pc, ex.badv());
        cpu.stats.exceptions_taken += 1;
        tracing::debug!(
            era = format_args!("{:#010x}", wb.pc),
            entry = format_args!("{:#010x}", entry),
            %ex,
            "exception taken"
        );
        return Some(entry);
    }

    if wb.ctrl.is_ertn {
        let target = cpu.csrs.return_from_exception();
        cpu.stats.ertn_count += 1;
        cpu.stats.instructions_retired += 1;
        tracing::debug!(target = format_args!("{:#010x}", target), "ERTN");
        return Some(target);
    }

    // CSR access: the read observes the pre-write value; the masked write
    // applies atomically within this commit.
    let mut value = wb.result;
    if wb.ctrl.csr_read {
        value = cpu.csrs.read(wb.csr_num);
    }
    if wb.ctrl.csr_write {
        cpu.csrs.write(wb.csr_num, wb.csr_wmask, wb.csr_wvalue);
    }
    if wb.ctrl.rdcntvl {
        value = cpu.counter as u32;
    } else if wb.ctrl.rdcntvh {
        value = (cpu.counter >> 32) as u32;
    }

    if wb.ctrl.reg_write {
        cpu.regs.write(wb.rd, value);
    }
    cpu.stats.instructions_retired += 1;

    tracing::trace!(
        pc = format_args!("{:#010x}", wb.pc),
        inst = format_args!("{:#010x}", wb.inst),
        "WB"
    );
    None
}
