//! CPU core definition and initialization.
//!
//! This module defines the central `Cpu` structure containing the whole
//! processor control-path state. It coordinates:
//! 1. **State Management:** Registers, program counter, and the CSR file.
//! 2. **Pipeline Control:** The four inter-stage latches and the cycle loop.
//! 3. **Address Translation:** The MMU with its TLB.
//! 4. **Collaborator Seams:** The external bus and instruction decoder.

/// Cycle-loop orchestration and pipeline flushing.
pub mod execution;

use std::fmt;

use crate::common::RegisterFile;
use crate::config::Config;
use crate::core::arch::csr::CsrFile;
use crate::core::pipeline::codec::BundleCodec;
use crate::core::pipeline::latches::{DecodeExecute, ExecuteMemory, FetchDecode, MemoryWriteback};
use crate::core::units::mmu::Mmu;
use crate::isa::decode::{InstDecoder, SystemDecoder};
use crate::soc::Bus;
use crate::stats::SimStats;

/// Main CPU structure containing all control-path state.
///
/// The CPU advances the five-stage pipeline one cycle per [`Cpu::tick`],
/// owns the architectural state (registers, CSR file, TLB), and talks to
/// the external world through the bus and decoder seams.
pub struct Cpu {
    /// General-purpose registers.
    pub regs: RegisterFile,
    /// Program counter (next fetch address).
    pub pc: u32,
    /// Control and status registers, including timer state.
    pub csrs: CsrFile,
    /// Memory management unit (TLB and translation).
    pub mmu: Mmu,

    /// Physical memory bus (external collaborator).
    pub bus: Box<dyn Bus>,
    /// Instruction decoder (external collaborator).
    pub decoder: Box<dyn InstDecoder>,
    /// Bundle wire-format codec for the configured generation.
    pub codec: BundleCodec,

    /// IF/ID latch.
    pub if_id: Option<FetchDecode>,
    /// ID/EX latch.
    pub id_ex: Option<DecodeExecute>,
    /// EX/MEM latch.
    pub ex_mem: Option<ExecuteMemory>,
    /// MEM/WB latch.
    pub mem_wb: Option<MemoryWriteback>,

    /// Free-running stable counter read by RDCNTVL.W/RDCNTVH.W.
    pub counter: u64,
    /// Simulation statistics.
    pub stats: SimStats,
    /// Configuration the core was built with.
    pub config: Config,
}

impl Cpu {
    /// Creates a CPU in the reset state over the given bus, using the
    /// reference system decoder for the configured generation.
    pub fn new(bus: Box<dyn Bus>, config: Config) -> Self {
        let decoder = Box::new(SystemDecoder::new(config.generation));
        Self::with_decoder(bus, decoder, config)
    }

    /// Creates a CPU with a caller-supplied decoder collaborator.
    pub fn with_decoder(
        bus: Box<dyn Bus>,
        decoder: Box<dyn InstDecoder>,
        config: Config,
    ) -> Self {
        Self {
            regs: RegisterFile::new(),
            pc: config.reset_pc,
            csrs: CsrFile::new(),
            mmu: Mmu::new(config.tlb_entries),
            bus,
            decoder,
            codec: BundleCodec::new(config.generation),
            if_id: None,
            id_ex: None,
            ex_mem: None,
            mem_wb: None,
            counter: 0,
            stats: SimStats::new(),
            config,
        }
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("pc", &format_args!("{:#010x}", self.pc))
            .field("plv", &self.csrs.plv())
            .field("cycles", &self.stats.cycles)
            .finish_non_exhaustive()
    }
}
