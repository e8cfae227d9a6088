//! Reference decoder for the system/privileged instruction subset.
//!
//! The full instruction decoder is an external collaborator of this core; the
//! pipeline consumes it through the [`InstDecoder`] trait. `SystemDecoder`
//! is the reference implementation covering exactly the subset the control
//! path exercises: CSR access, TLB maintenance, exception entry/return,
//! counter reads, loads/stores, and two immediate ALU ops for datapath glue.
//! Everything else — and every opcode above the configured generation's
//! capability — decodes to `None`, which the Decode stage reports as INE.

use crate::common::MemWidth;
use crate::config::CoreGeneration;
use crate::core::pipeline::signals::{AluOp, ControlSignals, TlbOp};
use crate::core::units::mmu::tlb::INVTLB_OP_MAX;

use super::opcodes::{
    csr_num, op10, rd, rj, rk, si12, ui12, INST_BREAK_BASE, INST_ERTN, INST_IDLE_BASE,
    INST_INVTLB_BASE, INST_RDCNT_HIGH_BASE, INST_RDCNT_LOW_BASE, INST_SYSCALL_BASE, INST_TLBFILL,
    INST_TLBRD, INST_TLBSRCH, INST_TLBWR, MASK_CODE15, MASK_RDCNT, OP_ADDI_W, OP_ANDI,
    OP_CSR_CLASS, OP_LD_B, OP_LD_BU, OP_LD_H, OP_LD_HU, OP_LD_W, OP_ST_B, OP_ST_H, OP_ST_W,
};

/// A decoded instruction: control signals plus operand fields.
///
/// The `reads_*` flags drive hazard detection; they name which register
/// indices the instruction actually consumes.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodedInst {
    /// Control signals for the pipeline.
    pub ctrl: ControlSignals,
    /// Destination register index.
    pub rd: usize,
    /// First source register index.
    pub rj: usize,
    /// Second source register index.
    pub rk: usize,
    /// Whether rj is read.
    pub reads_rj: bool,
    /// Whether rk is read.
    pub reads_rk: bool,
    /// Whether rd is read as a source (CSRWR/CSRXCHG data, store data).
    pub reads_rd: bool,
    /// Sign-extended immediate.
    pub imm: i32,
    /// CSR number for CSR instructions.
    pub csr_num: u16,
    /// INVTLB selector.
    pub invtlb_op: u8,
}

/// The instruction decoder consumed by the Decode stage.
///
/// Returns `None` for encodings the decoder does not define; the pipeline
/// raises INE for those.
pub trait InstDecoder {
    /// Decodes one instruction word.
    fn decode(&self, inst: u32) -> Option<DecodedInst>;
}

/// Reference decoder for the system subset, gated by core generation.
///
/// Generations below `CsrTimer` refuse CSR, counter, and ERTN encodings;
/// generations below `Tlb` refuse the TLB maintenance encodings. This
/// mirrors the historical capability ladder of the core.
#[derive(Clone, Copy, Debug)]
pub struct SystemDecoder {
    generation: CoreGeneration,
}

impl SystemDecoder {
    /// Creates a decoder for the given generation.
    pub fn new(generation: CoreGeneration) -> Self {
        Self { generation }
    }

    fn decode_csr_class(&self, inst: u32) -> Option<DecodedInst> {
        if !self.generation.has_csr() {
            return None;
        }
        let mut dec = DecodedInst {
            rd: rd(inst),
            rj: rj(inst),
            csr_num: csr_num(inst),
            ..DecodedInst::default()
        };
        dec.ctrl.privileged = true;
        dec.ctrl.csr_read = true;
        dec.ctrl.reg_write = true;
        match rj(inst) {
            // CSRRD rd, csr
            0 => {}
            // CSRWR rd, csr
            1 => {
                dec.ctrl.csr_write = true;
                dec.reads_rd = true;
            }
            // CSRXCHG rd, rj, csr
            _ => {
                dec.ctrl.csr_write = true;
                dec.ctrl.csr_use_mask = true;
                dec.reads_rd = true;
                dec.reads_rj = true;
            }
        }
        Some(dec)
    }

    fn decode_rdcnt(&self, inst: u32) -> Option<DecodedInst> {
        if !self.generation.has_csr() {
            return None;
        }
        let mut dec = DecodedInst {
            rd: rd(inst),
            ..DecodedInst::default()
        };
        dec.ctrl.reg_write = true;
        if inst & MASK_RDCNT == INST_RDCNT_LOW_BASE {
            if rj(inst) == 0 {
                dec.ctrl.rdcntvl = true;
            } else if rd(inst) == 0 {
                // RDCNTID rj: the counter identifier (TID) lands in rj.
                dec.rd = rj(inst);
                dec.ctrl.csr_read = true;
                dec.csr_num = crate::core::arch::csr::CSR_TID;
            } else {
                return None;
            }
            return Some(dec);
        }
        if inst & MASK_RDCNT == INST_RDCNT_HIGH_BASE && rj(inst) == 0 {
            dec.ctrl.rdcntvh = true;
            return Some(dec);
        }
        None
    }

    fn decode_memory(&self, inst: u32) -> Option<DecodedInst> {
        let (read, width, signed) = match op10(inst) {
            OP_LD_B => (true, MemWidth::Byte, true),
            OP_LD_H => (true, MemWidth::Half, true),
            OP_LD_W => (true, MemWidth::Word, true),
            OP_LD_BU => (true, MemWidth::Byte, false),
            OP_LD_HU => (true, MemWidth::Half, false),
            OP_ST_B => (false, MemWidth::Byte, false),
            OP_ST_H => (false, MemWidth::Half, false),
            OP_ST_W => (false, MemWidth::Word, false),
            _ => return None,
        };
        let mut dec = DecodedInst {
            rd: rd(inst),
            rj: rj(inst),
            reads_rj: true,
            imm: si12(inst),
            ..DecodedInst::default()
        };
        dec.ctrl.mem_width = width;
        dec.ctrl.mem_signed = signed;
        if read {
            dec.ctrl.mem_read = true;
            dec.ctrl.reg_write = true;
        } else {
            dec.ctrl.mem_write = true;
            dec.reads_rd = true;
        }
        Some(dec)
    }
}

impl InstDecoder for SystemDecoder {
    fn decode(&self, inst: u32) -> Option<DecodedInst> {
        // CSR access class: opcode 0000_0100.
        if inst >> 24 == OP_CSR_CLASS {
            return self.decode_csr_class(inst);
        }

        match inst {
            INST_ERTN if self.generation.has_exception() => {
                let mut dec = DecodedInst::default();
                dec.ctrl.is_ertn = true;
                dec.ctrl.privileged = true;
                return Some(dec);
            }
            INST_TLBSRCH | INST_TLBRD | INST_TLBWR | INST_TLBFILL
                if self.generation.has_tlb() =>
            {
                let mut dec = DecodedInst::default();
                dec.ctrl.privileged = true;
                dec.ctrl.tlb_op = match inst {
                    INST_TLBSRCH => TlbOp::Search,
                    INST_TLBRD => TlbOp::Read,
                    INST_TLBWR => TlbOp::Write,
                    _ => TlbOp::Fill,
                };
                return Some(dec);
            }
            _ => {}
        }

        if inst & MASK_CODE15 == INST_INVTLB_BASE {
            if !self.generation.has_tlb() {
                return None;
            }
            let op = (inst & 0x1F) as u8;
            // Reserved selectors are undefined encodings.
            if op > INVTLB_OP_MAX {
                return None;
            }
            let mut dec = DecodedInst {
                rj: rj(inst),
                rk: rk(inst),
                reads_rj: true,
                reads_rk: true,
                invtlb_op: op,
                ..DecodedInst::default()
            };
            dec.ctrl.privileged = true;
            dec.ctrl.tlb_op = TlbOp::Invalidate;
            return Some(dec);
        }

        if inst & MASK_CODE15 == INST_SYSCALL_BASE {
            if !self.generation.has_exception() {
                return None;
            }
            let mut dec = DecodedInst::default();
            dec.ctrl.is_syscall = true;
            return Some(dec);
        }

        if inst & MASK_CODE15 == INST_BREAK_BASE {
            if !self.generation.has_exception() {
                return None;
            }
            let mut dec = DecodedInst::default();
            dec.ctrl.is_break = true;
            return Some(dec);
        }

        if inst & MASK_CODE15 == INST_IDLE_BASE {
            // IDLE retires as a no-op in this functional model; it still
            // requires PLV0.
            let mut dec = DecodedInst::default();
            dec.ctrl.privileged = true;
            return Some(dec);
        }

        if let Some(dec) = self.decode_rdcnt(inst) {
            return Some(dec);
        }

        match op10(inst) {
            OP_ADDI_W => {
                let mut dec = DecodedInst {
                    rd: rd(inst),
                    rj: rj(inst),
                    reads_rj: true,
                    imm: si12(inst),
                    ..DecodedInst::default()
                };
                dec.ctrl.reg_write = true;
                dec.ctrl.alu_op = AluOp::Add;
                Some(dec)
            }
            OP_ANDI => {
                let mut dec = DecodedInst {
                    rd: rd(inst),
                    rj: rj(inst),
                    reads_rj: true,
                    imm: ui12(inst),
                    ..DecodedInst::default()
                };
                dec.ctrl.reg_write = true;
                dec.ctrl.alu_op = AluOp::And;
                Some(dec)
            }
            _ => self.decode_memory(inst),
        }
    }
}
