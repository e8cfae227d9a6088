//! Main execution loop.
//!
//! This module implements the cycle-level step of the CPU. It performs:
//! 1. **Stage Sequencing:** Evaluates the stages commit-first so each reads
//!    the previous cycle's latches (synchronous register semantics).
//! 2. **Flush and Redirect:** On a committed exception, interrupt, or ERTN,
//!    discards every younger in-flight bundle and steers fetch.
//! 3. **Timekeeping:** Advances the countdown timer and the stable counter;
//!    a committing instruction's CSR/TLB effects apply before the same
//!    cycle's timer tick.
//! 4. **Observability:** Wire-format snapshots of the latches for golden
//!    traces.

use super::Cpu;
use crate::core::pipeline::codec::{
    CounterFields, CsrFields, DecodeExecuteWire, ExceptionFields, ExecuteMemoryWire,
    FetchDecodeWire, MemoryWritebackWire, TlbFields,
};
use crate::core::pipeline::stages::decode::decode_stage;
use crate::core::pipeline::stages::execute::execute_stage;
use crate::core::pipeline::stages::fetch::fetch_stage;
use crate::core::pipeline::stages::memory::memory_stage;
use crate::core::pipeline::stages::writeback::writeback_stage;

impl Cpu {
    /// Advances the core by one clock cycle.
    ///
    /// When the committing instruction redirects (exception, interrupt, or
    /// ERTN), the younger stages do not run this cycle: their bundles are
    /// discarded atomically at the stage boundary and none of their side
    /// effects can occur.
    pub fn tick(&mut self) {
        if let Some(target) = writeback_stage(self) {
            self.flush_pipeline();
            self.pc = target;
        } else {
            memory_stage(self);
            execute_stage(self);
            let stalled = decode_stage(self);
            if !stalled {
                fetch_stage(self);
            }
        }

        // Ordering decision: instruction effects first, then the timer.
        self.csrs.tick_timer();
        self.counter += 1;
        self.stats.cycles += 1;
        self.stats.tlb_multi_hits = self.mmu.multi_hits;
    }

    /// Runs the core for `cycles` clock cycles.
    pub fn run(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.tick();
        }
    }

    /// Discards every in-flight bundle.
    pub fn flush_pipeline(&mut self) {
        self.if_id = None;
        self.id_ex = None;
        self.ex_mem = None;
        self.mem_wb = None;
        self.stats.flushes += 1;
    }

    /// Encodes the four latches into their wire-format images.
    ///
    /// Empty latches encode as zeroed bundles. The datapath payload bits are
    /// outside this core's contract and encode as zero.
    pub fn wire_snapshot(&self) -> [Vec<u8>; 4] {
        let if_id = self.if_id.as_ref().map_or_else(FetchDecodeWire::default, |b| {
            FetchDecodeWire {
                inst: b.inst,
                pc: b.pc,
                ex: ExceptionFields::from_fault(b.fault.as_ref(), false),
                tlb: TlbFields::default(),
            }
        });

        let id_ex = self.id_ex.as_ref().map_or_else(DecodeExecuteWire::default, |b| {
            DecodeExecuteWire {
                inst: b.inst,
                pc: b.pc,
                payload: 0,
                cnt: CounterFields {
                    rdcntvl: b.ctrl.rdcntvl,
                    rdcntvh: b.ctrl.rdcntvh,
                },
                csr: CsrFields {
                    read: b.ctrl.csr_read,
                    we: b.ctrl.csr_write,
                    num: b.csr_num,
                    wmask: if b.ctrl.csr_use_mask { b.rj_val } else { u32::MAX },
                    wvalue: b.rd_val,
                },
                ex: ExceptionFields::from_fault(b.fault.as_ref(), b.ctrl.is_ertn),
                tlb: TlbFields::from_ctrl(&b.ctrl, b.invtlb_op),
            }
        });

        let ex_mem = self.ex_mem.as_ref().map_or_else(ExecuteMemoryWire::default, |b| {
            ExecuteMemoryWire {
                inst: b.inst,
                pc: b.pc,
                payload: 0,
                vaddr: b.vaddr,
                csr: CsrFields {
                    read: b.ctrl.csr_read,
                    we: b.ctrl.csr_write,
                    num: b.csr_num,
                    wmask: b.csr_wmask,
                    wvalue: b.csr_wvalue,
                },
                ex: ExceptionFields::from_fault(b.fault.as_ref(), b.ctrl.is_ertn),
                tlb: TlbFields::from_ctrl(&b.ctrl, b.invtlb_op),
            }
        });

        let mem_wb = self.mem_wb.as_ref().map_or_else(MemoryWritebackWire::default, |b| {
            MemoryWritebackWire {
                inst: b.inst,
                pc: b.pc,
                payload: 0,
                vaddr: b.vaddr,
                csr: CsrFields {
                    read: b.ctrl.csr_read,
                    we: b.ctrl.csr_write,
                    num: b.csr_num,
                    wmask: b.csr_wmask,
                    wvalue: b.csr_wvalue,
                },
                ex: ExceptionFields::from_fault(b.fault.as_ref(), b.ctrl.is_ertn),
                tlb: TlbFields::from_ctrl(&b.ctrl, b.invtlb_op),
            }
        });

        [
            self.codec.encode_fetch_decode(&if_id),
            self.codec.encode_decode_execute(&id_ex),
            self.codec.encode_execute_memory(&ex_mem),
            self.codec.encode_memory_writeback(&mem_wb),
        ]
    }
}
