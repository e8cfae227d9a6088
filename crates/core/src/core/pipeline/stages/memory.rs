//! Memory Access (MEM) Stage.
//!
//! Fourth stage of the pipeline: translates data addresses, performs loads
//! and stores, and executes the TLB maintenance operations. All TLB
//! mutation happens here, issued by the single committing instruction that
//! reached this stage — never speculatively — so the TLB sees at most one
//! writer per cycle. A faulted bundle performs nothing.

use crate::common::error::{Exception, ECODE_TLBR};
use crate::common::{AccessType, MemWidth, VirtAddr};
use crate::core::arch::csr::{ASID_ASID, TLBIDX_INDEX, TLBIDX_NE, TLBIDX_PS_MASK, TLBIDX_PS_SHIFT};
use crate::core::pipeline::latches::MemoryWriteback;
use crate::core::pipeline::signals::TlbOp;
use crate::core::units::mmu::tlb::TlbEntry;
use crate::core::Cpu;

/// Executes the memory stage.
pub fn memory_stage(cpu: &mut Cpu) {
    let Some(mem) = cpu.ex_mem.take() else {
        cpu.mem_wb = None;
        return;
    };

    let mut fault = mem.fault;
    let mut result = mem.alu;

    if fault.is_none() && (mem.ctrl.mem_read || mem.ctrl.mem_write) {
        let access = if mem.ctrl.mem_write {
            AccessType::Store
        } else {
            AccessType::Load
        };
        match cpu
            .mmu
            .translate(&cpu.csrs, VirtAddr::new(mem.vaddr), access)
        {
            Err(ex) => {
                if ex.is_tlb_refill() {
                    cpu.stats.tlb_refills += 1;
                }
                tracing::trace!(
                    pc = format_args!("{:#010x}", mem.pc),
                    vaddr = format_args!("{:#010x}", mem.vaddr),
                    %ex,
                    "MEM fault"
                );
                fault = Some(ex);
            }
            Ok(translation) => {
                if mem.ctrl.mem_write {
                    if cpu
                        .bus
                        .write(translation.paddr, mem.ctrl.mem_width, mem.store_data)
                        .is_err()
                    {
                        fault = Some(Exception::MemAddressError(mem.vaddr));
                    }
                } else {
                    match cpu.bus.read(translation.paddr, mem.ctrl.mem_width) {
                        Ok(raw) => result = extend(raw, mem.ctrl.mem_width, mem.ctrl.mem_signed),
                        Err(_) => fault = Some(Exception::MemAddressError(mem.vaddr)),
                    }
                }
            }
        }
    }

    if fault.is_none() && mem.ctrl.tlb_op != TlbOp::None {
        run_tlb_op(cpu, mem.ctrl.tlb_op, mem.invtlb_op, mem.vaddr, mem.store_data);
    }

    cpu.mem_wb = Some(MemoryWriteback {
        pc: mem.pc,
        inst: mem.inst,
        ctrl: mem.ctrl,
        rd: mem.rd,
        result,
        vaddr: mem.vaddr,
        csr_num: mem.csr_num,
        csr_wmask: mem.csr_wmask,
        csr_wvalue: mem.csr_wvalue,
        invtlb_op: mem.invtlb_op,
        fault,
    });
}

/// Sign- or zero-extends a raw bus value to 32 bits.
fn extend(raw: u32, width: MemWidth, signed: bool) -> u32 {
    match (width, signed) {
        (MemWidth::Byte, true) => raw as u8 as i8 as i32 as u32,
        (MemWidth::Half, true) => raw as u16 as i16 as i32 as u32,
        _ => raw,
    }
}

/// Executes one TLB maintenance operation against the TLB and its CSR
/// staging registers.
fn run_tlb_op(cpu: &mut Cpu, op: TlbOp, invtlb_op: u8, vaddr: u32, asid_operand: u32) {
    match op {
        TlbOp::None => {}
        TlbOp::Search => {
            let hit = cpu.mmu.tlb.search(cpu.csrs.tlbehi, cpu.csrs.asid_value());
            match hit {
                Some(h) => {
                    if h.multiple_match {
                        cpu.mmu.multi_hits += 1;
                    }
                    cpu.csrs.tlbidx =
                        (cpu.csrs.tlbidx & !TLBIDX_INDEX & !TLBIDX_NE) | (h.index as u32 & TLBIDX_INDEX);
                }
                None => cpu.csrs.tlbidx |= TLBIDX_NE,
            }
            tracing::debug!(hit = hit.is_some(), "TLBSRCH");
        }
        TlbOp::Read => {
            let index = cpu.csrs.tlbidx_index();
            match cpu.mmu.tlb.read(index) {
                Some(entry) => {
                    entry.to_csrs(&mut cpu.csrs);
                    cpu.csrs.asid = (cpu.csrs.asid & !ASID_ASID) | u32::from(entry.asid);
                }
                None => {
                    // Empty slot: report NE and clear the staging registers.
                    cpu.csrs.tlbidx = (cpu.csrs.tlbidx
                        & !(TLBIDX_PS_MASK << TLBIDX_PS_SHIFT))
                        | TLBIDX_NE;
                    cpu.csrs.tlbehi = 0;
                    cpu.csrs.tlbelo0 = 0;
                    cpu.csrs.tlbelo1 = 0;
                }
            }
            tracing::debug!(index, "TLBRD");
        }
        TlbOp::Write | TlbOp::Fill => {
            let mut entry = TlbEntry::from_csrs(&cpu.csrs);
            // Inside a refill handler the written entry is live regardless
            // of the NE staging bit.
            entry.exists = cpu.csrs.estat_ecode() == ECODE_TLBR || !cpu.csrs.tlbidx_ne();
            let index = if op == TlbOp::Write {
                let index = cpu.csrs.tlbidx_index();
                cpu.mmu.tlb.write(index, entry);
                index
            } else {
                cpu.mmu.tlb.fill(entry)
            };
            tracing::debug!(
                index,
                vppn = format_args!("{:#07x}", entry.vppn),
                live = entry.exists,
                "TLB write"
            );
        }
        TlbOp::Invalidate => {
            cpu.mmu
                .tlb
                .invalidate(invtlb_op, (asid_operand & 0x3FF) as u16, vaddr);
            tracing::debug!(op = invtlb_op, "INVTLB");
        }
    }
}
