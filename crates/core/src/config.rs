//! Configuration system for the simulator core.
//!
//! This module defines the configuration structures used to parameterize the core.
//! It provides:
//! 1. **Defaults:** Baseline hardware constants (reset vector, TLB capacity).
//! 2. **Generations:** The four historical bundle-layout configurations.
//! 3. **Structures:** The `Config` struct consumed by [`crate::core::Cpu::new`].
//!
//! Configuration is supplied via JSON (deserialized with `serde`) or
//! `Config::default()` for the built-in defaults.

use serde::Deserialize;

/// Default configuration constants for the core.
///
/// These values define the baseline configuration when not explicitly
/// overridden.
mod defaults {
    /// Architectural reset vector.
    ///
    /// The core comes out of reset in direct address mode fetching from this
    /// physical address.
    pub const RESET_PC: u32 = 0x1C00_0000;

    /// Translation lookaside buffer entry count.
    ///
    /// The TLB is a fully associative store; sixteen entries matches the
    /// reference core and keeps the linear search cheap.
    pub const TLB_ENTRIES: usize = 16;
}

/// Bundle-layout generation of the core.
///
/// The inter-stage bundle format grew in four steps as the core gained
/// capability. A configuration selects exactly one generation; all four
/// stages and the codec must agree on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CoreGeneration {
    /// Plain pipeline: bundles carry only the instruction word and PC
    /// alongside the datapath payload.
    Baseline,

    /// Adds the exception field set (valid, ecode, esubcode, is_ertn) to
    /// every bundle, enabling precise exceptions and ERTN.
    Exception,

    /// Adds CSR-write intent, counter-read flags, and the faulting virtual
    /// address, enabling CSR instructions, exception vectoring, and the
    /// timer interrupt.
    CsrTimer,

    /// Adds the TLB-op intent fields, enabling TLB-based virtual memory.
    /// This is the full core and the default.
    #[default]
    Tlb,
}

impl CoreGeneration {
    /// Whether bundles of this generation carry the exception field set.
    pub fn has_exception(self) -> bool {
        self >= CoreGeneration::Exception
    }

    /// Whether bundles of this generation carry CSR intent, counter flags,
    /// and the faulting virtual address.
    pub fn has_csr(self) -> bool {
        self >= CoreGeneration::CsrTimer
    }

    /// Whether bundles of this generation carry the TLB-op intent fields.
    pub fn has_tlb(self) -> bool {
        self >= CoreGeneration::Tlb
    }
}

/// Top-level configuration for the simulator core.
///
/// All fields have defaults, so a JSON document may specify any subset.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bundle-layout generation (see [`CoreGeneration`]).
    pub generation: CoreGeneration,

    /// Number of TLB entries.
    pub tlb_entries: usize,

    /// PC value after reset.
    pub reset_pc: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: CoreGeneration::default(),
            tlb_entries: defaults::TLB_ENTRIES,
            reset_pc: defaults::RESET_PC,
        }
    }
}
