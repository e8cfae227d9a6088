//! Instruction Fetch (IF) Stage.
//!
//! First stage of the pipeline: translates the program counter, fetches the
//! instruction word, and pushes the IF/ID bundle. Faults detected here
//! (misaligned PC, translation faults, bus range errors) ride the bundle to
//! commit instead of being raised in place.

use crate::common::error::Exception;
use crate::common::{AccessType, VirtAddr};
use crate::core::pipeline::latches::FetchDecode;
use crate::core::Cpu;

/// Executes the fetch stage.
///
/// Holds when the IF/ID latch is still occupied (Decode stalled). A faulted
/// fetch still produces a bundle — carrying the fault instead of an
/// instruction — so the exception commits precisely in program order.
pub fn fetch_stage(cpu: &mut Cpu) {
    if cpu.if_id.is_some() {
        return;
    }

    let pc = cpu.pc;
    let mut fault: Option<Exception> = None;
    let mut inst = 0;

    if pc & 3 != 0 {
        fault = Some(Exception::FetchAddressError(pc));
    } else {
        match cpu.mmu.translate(&cpu.csrs, VirtAddr::new(pc), AccessType::Fetch) {
            Ok(translation) => match cpu.bus.fetch(translation.paddr) {
                Ok(word) => inst = word,
                Err(_) => fault = Some(Exception::FetchAddressError(pc)),
            },
            Err(ex) => {
                if ex.is_tlb_refill() {
                    cpu.stats.tlb_refills += 1;
                }
                fault = Some(ex);
            }
        }
    }

    if let Some(ref ex) = fault {
        tracing::trace!(pc = format_args!("{:#010x}", pc), %ex, "IF fault");
    } else {
        tracing::trace!(
            pc = format_args!("{:#010x}", pc),
            inst = format_args!("{:#010x}", inst),
            "IF"
        );
    }

    cpu.if_id = Some(FetchDecode { pc, inst, fault });
    cpu.pc = pc.wrapping_add(4);
}
