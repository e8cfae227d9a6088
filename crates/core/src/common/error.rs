//! Exception and codec error definitions.
//!
//! This module defines the error handling machinery for the simulator. It provides:
//! 1. **Exception Representation:** Architectural exceptions and interrupts with their
//!    latched fault addresses, mirroring the ECODE/ESUBCODE space of the core.
//! 2. **Code Mapping:** Conversion between `Exception` values and the raw 6/9-bit
//!    ecode/esubcode pair carried through the pipeline bundles.
//! 3. **Codec Errors:** The fatal bundle-width mismatch reported by the stage codec.

use std::fmt;

use thiserror::Error;

/// ECODE value for an interrupt.
pub const ECODE_INT: u8 = 0;
/// ECODE value for a load page-invalid fault.
pub const ECODE_PIL: u8 = 1;
/// ECODE value for a store page-invalid fault.
pub const ECODE_PIS: u8 = 2;
/// ECODE value for a fetch page-invalid fault.
pub const ECODE_PIF: u8 = 3;
/// ECODE value for a page-modify fault (store to a clean page).
pub const ECODE_PME: u8 = 4;
/// ECODE value for a page-privilege fault.
pub const ECODE_PPI: u8 = 7;
/// ECODE value for an address error (fetch or memory).
pub const ECODE_ADE: u8 = 8;
/// ECODE value for an unaligned access.
pub const ECODE_ALE: u8 = 9;
/// ECODE value for a system call.
pub const ECODE_SYS: u8 = 11;
/// ECODE value for a breakpoint.
pub const ECODE_BRK: u8 = 12;
/// ECODE value for an instruction that does not exist.
pub const ECODE_INE: u8 = 13;
/// ECODE value for a privileged instruction executed without privilege.
pub const ECODE_IPE: u8 = 14;
/// ECODE value reserved for the implementation-custom refresh exception.
///
/// Carried for layout compatibility; the core never raises it.
pub const ECODE_REFR: u8 = 60;
/// ECODE value for a TLB refill.
pub const ECODE_TLBR: u8 = 63;

/// ESUBCODE for an address error on instruction fetch.
pub const ESUBCODE_ADEF: u16 = 0;
/// ESUBCODE for an address error on a data access.
pub const ESUBCODE_ADEM: u16 = 1;

/// Architectural exceptions and interrupts.
///
/// An `Exception` is carried through the pipeline bundles from the stage that
/// detected it to commit, where it vectors the core to EENTRY or TLBRENTRY.
/// Variants for address-class faults carry the faulting virtual address, which
/// is latched into BADV on commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exception {
    /// Asynchronous interrupt (timer, software, or hardware line).
    ///
    /// Sampled at commit; outranks any exception of the committing instruction.
    Interrupt,

    /// TLB refill: no TLB entry matched the access.
    ///
    /// Vectors to TLBRENTRY rather than EENTRY. The associated value is the
    /// faulting virtual address.
    TlbRefill(u32),

    /// Instruction fetch hit a TLB entry whose page is invalid (PIF).
    FetchPageInvalid(u32),

    /// Load hit a TLB entry whose page is invalid (PIL).
    LoadPageInvalid(u32),

    /// Store hit a TLB entry whose page is invalid (PIS).
    StorePageInvalid(u32),

    /// Store to a mapped page whose dirty bit is clear (PME).
    PageModifyFault(u32),

    /// Access to a page whose privilege level is stricter than the current one (PPI).
    PagePrivilegeFault(u32),

    /// Address error on instruction fetch (ADE/ADEF): misaligned or unmappable PC.
    FetchAddressError(u32),

    /// Address error on a data access (ADE/ADEM): access outside the bus range.
    MemAddressError(u32),

    /// Unaligned data access (ALE). The associated value is the misaligned address.
    AddressUnaligned(u32),

    /// `SYSCALL` instruction.
    Syscall,

    /// `BREAK` instruction.
    Breakpoint,

    /// Undecodable instruction (INE). The associated value is the encoding.
    InstructionNotExist(u32),

    /// Privileged instruction executed at PLV3 (IPE).
    PrivilegeError,

    /// Implementation-reserved refresh exception (ECODE 60).
    ///
    /// Defined for code-space completeness; the core has no raise site for it.
    Refresh,
}

impl Exception {
    /// Returns the 6-bit ECODE for this exception.
    pub fn ecode(&self) -> u8 {
        match self {
            Exception::Interrupt => ECODE_INT,
            Exception::TlbRefill(_) => ECODE_TLBR,
            Exception::FetchPageInvalid(_) => ECODE_PIF,
            Exception::LoadPageInvalid(_) => ECODE_PIL,
            Exception::StorePageInvalid(_) => ECODE_PIS,
            Exception::PageModifyFault(_) => ECODE_PME,
            Exception::PagePrivilegeFault(_) => ECODE_PPI,
            Exception::FetchAddressError(_) | Exception::MemAddressError(_) => ECODE_ADE,
            Exception::AddressUnaligned(_) => ECODE_ALE,
            Exception::Syscall => ECODE_SYS,
            Exception::Breakpoint => ECODE_BRK,
            Exception::InstructionNotExist(_) => ECODE_INE,
            Exception::PrivilegeError => ECODE_IPE,
            Exception::Refresh => ECODE_REFR,
        }
    }

    /// Returns the 9-bit ESUBCODE for this exception.
    ///
    /// Only the address-error class distinguishes subcodes (ADEF vs. ADEM);
    /// every other ecode uses subcode 0.
    pub fn esubcode(&self) -> u16 {
        match self {
            Exception::FetchAddressError(_) => ESUBCODE_ADEF,
            Exception::MemAddressError(_) => ESUBCODE_ADEM,
            _ => 0,
        }
    }

    /// Returns the faulting virtual address for address-class exceptions.
    ///
    /// This is the value latched into BADV on commit; non-address exceptions
    /// return `None` and leave BADV untouched.
    pub fn badv(&self) -> Option<u32> {
        match *self {
            Exception::TlbRefill(a)
            | Exception::FetchPageInvalid(a)
            | Exception::LoadPageInvalid(a)
            | Exception::StorePageInvalid(a)
            | Exception::PageModifyFault(a)
            | Exception::PagePrivilegeFault(a)
            | Exception::FetchAddressError(a)
            | Exception::MemAddressError(a)
            | Exception::AddressUnaligned(a) => Some(a),
            _ => None,
        }
    }

    /// Whether this exception belongs to the TLB-refill class.
    ///
    /// Refill-class exceptions vector to TLBRENTRY and switch the core into
    /// direct address mode for the duration of the handler.
    pub fn is_tlb_refill(&self) -> bool {
        matches!(self, Exception::TlbRefill(_))
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exception::Interrupt => write!(f, "Interrupt"),
            Exception::TlbRefill(a) => write!(f, "TlbRefill({:#x})", a),
            Exception::FetchPageInvalid(a) => write!(f, "FetchPageInvalid({:#x})", a),
            Exception::LoadPageInvalid(a) => write!(f, "LoadPageInvalid({:#x})", a),
            Exception::StorePageInvalid(a) => write!(f, "StorePageInvalid({:#x})", a),
            Exception::PageModifyFault(a) => write!(f, "PageModifyFault({:#x})", a),
            Exception::PagePrivilegeFault(a) => write!(f, "PagePrivilegeFault({:#x})", a),
            Exception::FetchAddressError(a) => write!(f, "FetchAddressError({:#x})", a),
            Exception::MemAddressError(a) => write!(f, "MemAddressError({:#x})", a),
            Exception::AddressUnaligned(a) => write!(f, "AddressUnaligned({:#x})", a),
            Exception::Syscall => write!(f, "Syscall"),
            Exception::Breakpoint => write!(f, "Breakpoint"),
            Exception::InstructionNotExist(i) => write!(f, "InstructionNotExist({:#010x})", i),
            Exception::PrivilegeError => write!(f, "PrivilegeError"),
            Exception::Refresh => write!(f, "Refresh"),
        }
    }
}

impl std::error::Error for Exception {}

/// Fatal stage-codec error: a bundle bitstring does not match the configured layout.
///
/// This indicates the pipeline configuration is inconsistent across stages and
/// is not recoverable; it surfaces immediately to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("malformed {link} bundle: got {got} bits, layout requires {want}")]
pub struct BundleError {
    /// The inter-stage link whose bundle failed to decode.
    pub link: StageLink,
    /// Bit width of the rejected input.
    pub got: usize,
    /// Bit width the configured layout requires.
    pub want: usize,
}

/// The four inter-stage links of the five-stage pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageLink {
    /// Fetch to Decode.
    FetchDecode,
    /// Decode to Execute.
    DecodeExecute,
    /// Execute to Memory.
    ExecuteMemory,
    /// Memory to Writeback.
    MemoryWriteback,
}

impl fmt::Display for StageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageLink::FetchDecode => write!(f, "IF/ID"),
            StageLink::DecodeExecute => write!(f, "ID/EX"),
            StageLink::ExecuteMemory => write!(f, "EX/MEM"),
            StageLink::MemoryWriteback => write!(f, "MEM/WB"),
        }
    }
}
