//! Stage bundle codec.
//!
//! The inter-stage bundles have a fixed-width wire format, used for golden
//! traces and cross-checking against the hardware design the core models.
//! This module packs and unpacks that format. It provides:
//! 1. **Field Sets:** The exception, CSR-intent, counter, and TLB-intent
//!    field groups appended to the base bundles by successive generations.
//! 2. **Layouts:** The four generation-selected width configurations; all
//!    stages of a core share one configuration.
//! 3. **Round Trip:** `encode` and `decode` are byte-exact inverses;
//!    reserved bit positions are zero. Width mismatches fail with the fatal
//!    [`BundleError`].
//!
//! Bit order: fields pack LSB-first in declaration order — instruction word,
//! PC, opaque datapath payload, then per-generation field sets (virtual
//! address, counter, CSR, exception, TLB) toward the MSB. The encoded buffer
//! occupies the minimum whole number of bytes.

use crate::common::error::{BundleError, StageLink};
use crate::common::Exception;
use crate::config::CoreGeneration;
use crate::core::pipeline::signals::ControlSignals;

/// Width of the exception field set: valid, ecode, esubcode, is_ertn.
pub const EX_FIELDS_LEN: usize = 17;

/// Width of the CSR field set: read, we, num, wmask, wvalue.
pub const CSR_FIELDS_LEN: usize = 80;

/// Width of the counter field set: rdcntvl, rdcntvh.
pub const CNT_FIELDS_LEN: usize = 2;

/// Width of the TLB field set: tlb_op, invtlb_op.
pub const TLB_FIELDS_LEN: usize = 8;

/// Width of the carried data virtual address.
pub const VADDR_LEN: usize = 32;

/// Base width of the IF/ID bundle: instruction word and PC.
pub const IF2ID_BASE_LEN: usize = 64;

/// Base width of the ID/EX bundle: instruction, PC, and datapath payload.
pub const ID2EXE_BASE_LEN: usize = 158;

/// Base width of the EX/MEM bundle.
pub const EXE2MEM_BASE_LEN: usize = 75;

/// Base width of the MEM/WB bundle.
pub const MEM2WB_BASE_LEN: usize = 70;

/// The exception field set carried by every bundle from the
/// exception-aware generation on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExceptionFields {
    /// An exception has been detected for this instruction.
    pub valid: bool,
    /// 6-bit exception code.
    pub ecode: u8,
    /// 9-bit exception subcode.
    pub esubcode: u16,
    /// The instruction is an exception return.
    pub is_ertn: bool,
}

impl ExceptionFields {
    /// Builds the field set from a bundle's fault slot and control signals.
    pub fn from_fault(fault: Option<&Exception>, is_ertn: bool) -> Self {
        match fault {
            Some(ex) => Self {
                valid: true,
                ecode: ex.ecode(),
                esubcode: ex.esubcode(),
                is_ertn,
            },
            None => Self {
                valid: false,
                ecode: 0,
                esubcode: 0,
                is_ertn,
            },
        }
    }
}

/// The CSR intent field set carried from the CSR-aware generation on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CsrFields {
    /// The instruction reads a CSR.
    pub read: bool,
    /// The instruction writes a CSR.
    pub we: bool,
    /// 14-bit CSR number.
    pub num: u16,
    /// 32-bit write mask.
    pub wmask: u32,
    /// 32-bit write value.
    pub wvalue: u32,
}

/// The counter-read field set carried by the ID/EX bundle from the
/// CSR-aware generation on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterFields {
    /// The instruction reads the low counter word.
    pub rdcntvl: bool,
    /// The instruction reads the high counter word.
    pub rdcntvh: bool,
}

/// The TLB intent field set carried from the TLB-aware generation on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TlbFields {
    /// 3-bit TLB operation encoding.
    pub tlb_op: u8,
    /// 5-bit INVTLB selector.
    pub invtlb_op: u8,
}

impl TlbFields {
    /// Builds the field set from decoded control signals.
    pub fn from_ctrl(ctrl: &ControlSignals, invtlb_op: u8) -> Self {
        Self {
            tlb_op: ctrl.tlb_op.to_bits(),
            invtlb_op: invtlb_op & 0x1F,
        }
    }
}

/// Wire image of the IF/ID bundle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchDecodeWire {
    /// Instruction word.
    pub inst: u32,
    /// Program counter.
    pub pc: u32,
    /// Exception field set (exception-aware generations).
    pub ex: ExceptionFields,
    /// TLB field set (TLB-aware generation).
    pub tlb: TlbFields,
}

/// Wire image of the ID/EX bundle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeExecuteWire {
    /// Instruction word.
    pub inst: u32,
    /// Program counter.
    pub pc: u32,
    /// Opaque datapath payload (94 bits). Owned by the excluded datapath;
    /// carried verbatim.
    pub payload: u128,
    /// Counter field set (CSR-aware generations).
    pub cnt: CounterFields,
    /// CSR field set (CSR-aware generations).
    pub csr: CsrFields,
    /// Exception field set (exception-aware generations).
    pub ex: ExceptionFields,
    /// TLB field set (TLB-aware generation).
    pub tlb: TlbFields,
}

/// Wire image of the EX/MEM bundle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecuteMemoryWire {
    /// Instruction word.
    pub inst: u32,
    /// Program counter.
    pub pc: u32,
    /// Opaque datapath payload (11 bits).
    pub payload: u16,
    /// Data virtual address (CSR-aware generations).
    pub vaddr: u32,
    /// CSR field set (CSR-aware generations).
    pub csr: CsrFields,
    /// Exception field set (exception-aware generations).
    pub ex: ExceptionFields,
    /// TLB field set (TLB-aware generation).
    pub tlb: TlbFields,
}

/// Wire image of the MEM/WB bundle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryWritebackWire {
    /// Instruction word.
    pub inst: u32,
    /// Program counter.
    pub pc: u32,
    /// Opaque datapath payload (6 bits).
    pub payload: u8,
    /// Data virtual address (CSR-aware generations).
    pub vaddr: u32,
    /// CSR field set (CSR-aware generations).
    pub csr: CsrFields,
    /// Exception field set (exception-aware generations).
    pub ex: ExceptionFields,
    /// TLB field set (TLB-aware generation).
    pub tlb: TlbFields,
}

/// Stage bundle codec for one layout generation.
///
/// Pure transform: no side effects, no internal state beyond the selected
/// generation.
#[derive(Clone, Copy, Debug)]
pub struct BundleCodec {
    generation: CoreGeneration,
}

impl BundleCodec {
    /// Creates a codec for the given generation.
    pub fn new(generation: CoreGeneration) -> Self {
        Self { generation }
    }

    /// The generation this codec encodes.
    pub fn generation(&self) -> CoreGeneration {
        self.generation
    }

    /// Total bit width of the bundle on `link` in this generation.
    pub fn width_bits(&self, link: StageLink) -> usize {
        let g = self.generation;
        let ex = if g.has_exception() { EX_FIELDS_LEN } else { 0 };
        let tlb = if g.has_tlb() { TLB_FIELDS_LEN } else { 0 };
        let csr = if g.has_csr() { CSR_FIELDS_LEN } else { 0 };
        let cnt = if g.has_csr() { CNT_FIELDS_LEN } else { 0 };
        let vaddr = if g.has_csr() { VADDR_LEN } else { 0 };
        match link {
            StageLink::FetchDecode => IF2ID_BASE_LEN + ex + tlb,
            StageLink::DecodeExecute => ID2EXE_BASE_LEN + cnt + csr + ex + tlb,
            StageLink::ExecuteMemory => EXE2MEM_BASE_LEN + vaddr + csr + ex + tlb,
            StageLink::MemoryWriteback => MEM2WB_BASE_LEN + vaddr + csr + ex + tlb,
        }
    }

    /// Encodes an IF/ID bundle.
    pub fn encode_fetch_decode(&self, wire: &FetchDecodeWire) -> Vec<u8> {
        let mut w = BitWriter::new(self.width_bits(StageLink::FetchDecode));
        w.push(u128::from(wire.inst), 32);
        w.push(u128::from(wire.pc), 32);
        self.push_ex(&mut w, &wire.ex);
        self.push_tlb(&mut w, &wire.tlb);
        w.finish()
    }

    /// Decodes an IF/ID bundle.
    ///
    /// # Errors
    ///
    /// Fails with [`BundleError`] when the input does not carry exactly the
    /// configured number of bits.
    pub fn decode_fetch_decode(&self, bytes: &[u8]) -> Result<FetchDecodeWire, BundleError> {
        let mut r = self.reader(StageLink::FetchDecode, bytes)?;
        Ok(FetchDecodeWire {
            inst: r.take(32) as u32,
            pc: r.take(32) as u32,
            ex: self.take_ex(&mut r),
            tlb: self.take_tlb(&mut r),
        })
    }

    /// Encodes an ID/EX bundle.
    pub fn encode_decode_execute(&self, wire: &DecodeExecuteWire) -> Vec<u8> {
        let mut w = BitWriter::new(self.width_bits(StageLink::DecodeExecute));
        w.push(u128::from(wire.inst), 32);
        w.push(u128::from(wire.pc), 32);
        w.push(wire.payload, (ID2EXE_BASE_LEN - 64) as u32);
        if self.generation.has_csr() {
            w.push(u128::from(wire.cnt.rdcntvl), 1);
            w.push(u128::from(wire.cnt.rdcntvh), 1);
            self.push_csr(&mut w, &wire.csr);
        }
        self.push_ex(&mut w, &wire.ex);
        self.push_tlb(&mut w, &wire.tlb);
        w.finish()
    }

    /// Decodes an ID/EX bundle.
    ///
    /// # Errors
    ///
    /// Fails with [`BundleError`] on a width mismatch.
    pub fn decode_decode_execute(&self, bytes: &[u8]) -> Result<DecodeExecuteWire, BundleError> {
        let mut r = self.reader(StageLink::DecodeExecute, bytes)?;
        let inst = r.take(32) as u32;
        let pc = r.take(32) as u32;
        let payload = r.take((ID2EXE_BASE_LEN - 64) as u32);
        let (cnt, csr) = if self.generation.has_csr() {
            let cnt = CounterFields {
                rdcntvl: r.take(1) != 0,
                rdcntvh: r.take(1) != 0,
            };
            (cnt, self.take_csr(&mut r))
        } else {
            (CounterFields::default(), CsrFields::default())
        };
        Ok(DecodeExecuteWire {
            inst,
            pc,
            payload,
            cnt,
            csr,
            ex: self.take_ex(&mut r),
            tlb: self.take_tlb(&mut r),
        })
    }

    /// Encodes an EX/MEM bundle.
    pub fn encode_execute_memory(&self, wire: &ExecuteMemoryWire) -> Vec<u8> {
        let mut w = BitWriter::new(self.width_bits(StageLink::ExecuteMemory));
        w.push(u128::from(wire.inst), 32);
        w.push(u128::from(wire.pc), 32);
        w.push(u128::from(wire.payload), (EXE2MEM_BASE_LEN - 64) as u32);
        if self.generation.has_csr() {
            w.push(u128::from(wire.vaddr), 32);
            self.push_csr(&mut w, &wire.csr);
        }
        self.push_ex(&mut w, &wire.ex);
        self.push_tlb(&mut w, &wire.tlb);
        w.finish()
    }

    /// Decodes an EX/MEM bundle.
    ///
    /// # Errors
    ///
    /// Fails with [`BundleError`] on a width mismatch.
    pub fn decode_execute_memory(&self, bytes: &[u8]) -> Result<ExecuteMemoryWire, BundleError> {
        let mut r = self.reader(StageLink::ExecuteMemory, bytes)?;
        let inst = r.take(32) as u32;
        let pc = r.take(32) as u32;
        let payload = r.take((EXE2MEM_BASE_LEN - 64) as u32) as u16;
        let (vaddr, csr) = if self.generation.has_csr() {
            (r.take(32) as u32, self.take_csr(&mut r))
        } else {
            (0, CsrFields::default())
        };
        Ok(ExecuteMemoryWire {
            inst,
            pc,
            payload,
            vaddr,
            csr,
            ex: self.take_ex(&mut r),
            tlb: self.take_tlb(&mut r),
        })
    }

    /// Encodes a MEM/WB bundle.
    pub fn encode_memory_writeback(&self, wire: &MemoryWritebackWire) -> Vec<u8> {
        let mut w = BitWriter::new(self.width_bits(StageLink::MemoryWriteback));
        w.push(u128::from(wire.inst), 32);
        w.push(u128::from(wire.pc), 32);
        w.push(u128::from(wire.payload), (MEM2WB_BASE_LEN - 64) as u32);
        if self.generation.has_csr() {
            w.push(u128::from(wire.vaddr), 32);
            self.push_csr(&mut w, &wire.csr);
        }
        self.push_ex(&mut w, &wire.ex);
        self.push_tlb(&mut w, &wire.tlb);
        w.finish()
    }

    /// Decodes a MEM/WB bundle.
    ///
    /// # Errors
    ///
    /// Fails with [`BundleError`] on a width mismatch.
    pub fn decode_memory_writeback(
        &self,
        bytes: &[u8],
    ) -> Result<MemoryWritebackWire, BundleError> {
        let mut r = self.reader(StageLink::MemoryWriteback, bytes)?;
        let inst = r.take(32) as u32;
        let pc = r.take(32) as u32;
        let payload = r.take((MEM2WB_BASE_LEN - 64) as u32) as u8;
        let (vaddr, csr) = if self.generation.has_csr() {
            (r.take(32) as u32, self.take_csr(&mut r))
        } else {
            (0, CsrFields::default())
        };
        Ok(MemoryWritebackWire {
            inst,
            pc,
            payload,
            vaddr,
            csr,
            ex: self.take_ex(&mut r),
            tlb: self.take_tlb(&mut r),
        })
    }

    fn push_ex(&self, w: &mut BitWriter, ex: &ExceptionFields) {
        if !self.generation.has_exception() {
            return;
        }
        w.push(u128::from(ex.valid), 1);
        w.push(u128::from(ex.ecode & 0x3F), 6);
        w.push(u128::from(ex.esubcode & 0x1FF), 9);
        w.push(u128::from(ex.is_ertn), 1);
    }

    fn take_ex(&self, r: &mut BitReader<'_>) -> ExceptionFields {
        if !self.generation.has_exception() {
            return ExceptionFields::default();
        }
        ExceptionFields {
            valid: r.take(1) != 0,
            ecode: r.take(6) as u8,
            esubcode: r.take(9) as u16,
            is_ertn: r.take(1) != 0,
        }
    }

    fn push_csr(&self, w: &mut BitWriter, csr: &CsrFields) {
        w.push(u128::from(csr.read), 1);
        w.push(u128::from(csr.we), 1);
        w.push(u128::from(csr.num & 0x3FFF), 14);
        w.push(u128::from(csr.wmask), 32);
        w.push(u128::from(csr.wvalue), 32);
    }

    fn take_csr(&self, r: &mut BitReader<'_>) -> CsrFields {
        CsrFields {
            read: r.take(1) != 0,
            we: r.take(1) != 0,
            num: r.take(14) as u16,
            wmask: r.take(32) as u32,
            wvalue: r.take(32) as u32,
        }
    }

    fn push_tlb(&self, w: &mut BitWriter, tlb: &TlbFields) {
        if !self.generation.has_tlb() {
            return;
        }
        w.push(u128::from(tlb.tlb_op & 0x7), 3);
        w.push(u128::from(tlb.invtlb_op & 0x1F), 5);
    }

    fn take_tlb(&self, r: &mut BitReader<'_>) -> TlbFields {
        if !self.generation.has_tlb() {
            return TlbFields::default();
        }
        TlbFields {
            tlb_op: r.take(3) as u8,
            invtlb_op: r.take(5) as u8,
        }
    }

    fn reader<'a>(
        &self,
        link: StageLink,
        bytes: &'a [u8],
    ) -> Result<BitReader<'a>, BundleError> {
        let want = self.width_bits(link);
        if bytes.len() != want.div_ceil(8) || !reserved_bits_zero(bytes, want) {
            return Err(BundleError {
                link,
                got: bytes.len() * 8,
                want,
            });
        }
        Ok(BitReader::new(bytes))
    }
}

/// Checks that the padding bits above `width` in the last byte are zero.
fn reserved_bits_zero(bytes: &[u8], width: usize) -> bool {
    let spare = bytes.len() * 8 - width;
    if spare == 0 {
        return true;
    }
    let last = bytes[bytes.len() - 1];
    last >> (8 - spare) == 0
}

/// LSB-first bit packer producing a fixed-width byte buffer.
struct BitWriter {
    bytes: Vec<u8>,
    pos: usize,
}

impl BitWriter {
    fn new(width: usize) -> Self {
        Self {
            bytes: vec![0; width.div_ceil(8)],
            pos: 0,
        }
    }

    fn push(&mut self, value: u128, bits: u32) {
        let value = if bits == 128 {
            value
        } else {
            value & ((1u128 << bits) - 1)
        };
        for i in 0..bits as usize {
            if value >> i & 1 != 0 {
                self.bytes[(self.pos + i) / 8] |= 1 << ((self.pos + i) % 8);
            }
        }
        self.pos += bits as usize;
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// LSB-first bit reader over a byte buffer.
struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, bits: u32) -> u128 {
        let mut value = 0u128;
        for i in 0..bits as usize {
            let bit = self.bytes[(self.pos + i) / 8] >> ((self.pos + i) % 8) & 1;
            value |= u128::from(bit) << i;
        }
        self.pos += bits as usize;
        value
    }
}
