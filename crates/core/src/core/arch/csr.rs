//! Control and Status Register (CSR) definitions and operations.
//!
//! This module implements the CSR subsystem of the core. It provides:
//! 1. **Address Definitions:** Constants for every architectural CSR number.
//! 2. **Field Masks:** Bitmasks and shifts for privilege, exception, timer, and TLB control.
//! 3. **Register Storage:** The `CsrFile` struct maintaining architectural state.
//! 4. **Access Logic:** Masked read/write plus exception entry/return and the timer tick.

use crate::common::error::ECODE_TLBR;
use crate::core::arch::mode::PrivilegeLevel;

/// Current mode CSR number.
pub const CSR_CRMD: u16 = 0;

/// Previous mode CSR number (exception save of CRMD).
pub const CSR_PRMD: u16 = 1;

/// Exception configuration CSR number.
pub const CSR_ECFG: u16 = 4;

/// Exception status CSR number.
pub const CSR_ESTAT: u16 = 5;

/// Exception return address CSR number.
pub const CSR_ERA: u16 = 6;

/// Bad virtual address CSR number.
pub const CSR_BADV: u16 = 7;

/// Exception entry address CSR number.
pub const CSR_EENTRY: u16 = 12;

/// TLB index CSR number.
pub const CSR_TLBIDX: u16 = 16;

/// TLB entry high (VPPN) CSR number.
pub const CSR_TLBEHI: u16 = 17;

/// TLB entry low 0 (even page) CSR number.
pub const CSR_TLBELO0: u16 = 18;

/// TLB entry low 1 (odd page) CSR number.
pub const CSR_TLBELO1: u16 = 19;

/// Address space identifier CSR number.
pub const CSR_ASID: u16 = 24;

/// First scratch save CSR number (SAVE0..SAVE3 are consecutive).
pub const CSR_SAVE0: u16 = 48;

/// Second scratch save CSR number.
pub const CSR_SAVE1: u16 = 49;

/// Third scratch save CSR number.
pub const CSR_SAVE2: u16 = 50;

/// Fourth scratch save CSR number.
pub const CSR_SAVE3: u16 = 51;

/// Timer identifier CSR number.
pub const CSR_TID: u16 = 64;

/// Timer configuration CSR number.
pub const CSR_TCFG: u16 = 65;

/// Timer value CSR number (read-only).
pub const CSR_TVAL: u16 = 66;

/// Timer interrupt clear CSR number (write-one-to-clear).
pub const CSR_TICLR: u16 = 68;

/// TLB refill exception entry address CSR number.
pub const CSR_TLBRENTRY: u16 = 136;

/// Direct mapping window 0 CSR number.
pub const CSR_DMW0: u16 = 384;

/// Direct mapping window 1 CSR number.
pub const CSR_DMW1: u16 = 385;

/// Privilege level field mask in CRMD (bits 1:0).
pub const CRMD_PLV: u32 = 0x3;

/// Global interrupt enable bit in CRMD.
pub const CRMD_IE: u32 = 1 << 2;

/// Direct address mode bit in CRMD.
pub const CRMD_DA: u32 = 1 << 3;

/// Paged address mode bit in CRMD.
pub const CRMD_PG: u32 = 1 << 4;

/// Direct-mode fetch memory access type field in CRMD (bits 6:5).
pub const CRMD_DATF: u32 = 0x3 << 5;

/// Direct-mode data memory access type field in CRMD (bits 8:7).
pub const CRMD_DATM: u32 = 0x3 << 7;

/// Previous privilege level field mask in PRMD (bits 1:0).
pub const PRMD_PPLV: u32 = 0x3;

/// Previous interrupt enable bit in PRMD.
pub const PRMD_PIE: u32 = 1 << 2;

/// Local interrupt enable field mask in ECFG (bits 12:0).
pub const ECFG_LIE: u32 = 0x1FFF;

/// Interrupt status field mask in ESTAT (bits 12:0).
pub const ESTAT_IS: u32 = 0x1FFF;

/// Software interrupt status field mask in ESTAT (bits 1:0, software-writable).
pub const ESTAT_IS_SW: u32 = 0x3;

/// Timer interrupt bit in ESTAT.IS.
pub const ESTAT_IS_TIMER: u32 = 1 << 11;

/// Bit shift of the Ecode field in ESTAT.
pub const ESTAT_ECODE_SHIFT: u32 = 16;

/// Field mask of the Ecode field in ESTAT (6 bits).
pub const ESTAT_ECODE_MASK: u32 = 0x3F;

/// Bit shift of the EsubCode field in ESTAT.
pub const ESTAT_ESUBCODE_SHIFT: u32 = 22;

/// Field mask of the EsubCode field in ESTAT (9 bits).
pub const ESTAT_ESUBCODE_MASK: u32 = 0x1FF;

/// Writable field mask of EENTRY and TLBRENTRY (bits 31:6).
pub const EENTRY_VA: u32 = 0xFFFF_FFC0;

/// Index field mask in TLBIDX (bits 3:0 for a 16-entry TLB).
pub const TLBIDX_INDEX: u32 = 0xF;

/// Bit shift of the page-size field in TLBIDX.
pub const TLBIDX_PS_SHIFT: u32 = 24;

/// Field mask of the page-size field in TLBIDX (6 bits).
pub const TLBIDX_PS_MASK: u32 = 0x3F;

/// "No entry" bit in TLBIDX.
pub const TLBIDX_NE: u32 = 1 << 31;

/// Writable field mask of TLBEHI (VPPN, bits 31:13).
pub const TLBEHI_VPPN: u32 = 0xFFFF_E000;

/// Valid bit in TLBELO0/1.
pub const TLBELO_V: u32 = 1 << 0;

/// Dirty bit in TLBELO0/1.
pub const TLBELO_D: u32 = 1 << 1;

/// Bit shift of the privilege-level field in TLBELO0/1.
pub const TLBELO_PLV_SHIFT: u32 = 2;

/// Field mask of the privilege-level field in TLBELO0/1 (2 bits).
pub const TLBELO_PLV_MASK: u32 = 0x3;

/// Bit shift of the memory access type field in TLBELO0/1.
pub const TLBELO_MAT_SHIFT: u32 = 4;

/// Field mask of the memory access type field in TLBELO0/1 (2 bits).
pub const TLBELO_MAT_MASK: u32 = 0x3;

/// Global bit in TLBELO0/1.
pub const TLBELO_G: u32 = 1 << 6;

/// Bit shift of the physical page number field in TLBELO0/1.
pub const TLBELO_PPN_SHIFT: u32 = 8;

/// Writable field mask of TLBELO0/1 (bit 7 is reserved-zero).
pub const TLBELO_WMASK: u32 = 0xFFFF_FF7F;

/// ASID field mask in the ASID CSR (bits 9:0).
pub const ASID_ASID: u32 = 0x3FF;

/// Value of the read-only ASIDBITS field in the ASID CSR (bits 23:16).
pub const ASID_ASIDBITS: u32 = 10 << 16;

/// Timer enable bit in TCFG.
pub const TCFG_EN: u32 = 1 << 0;

/// Periodic mode bit in TCFG.
pub const TCFG_PERIOD: u32 = 1 << 1;

/// Bit shift of the initial-value field in TCFG.
pub const TCFG_INITV_SHIFT: u32 = 2;

/// Timer interrupt clear bit in TICLR.
pub const TICLR_CLR: u32 = 1 << 0;

/// Lowest-PLV enable bit in DMW0/1 (window usable from PLV0).
pub const DMW_PLV0: u32 = 1 << 0;

/// Highest-PLV enable bit in DMW0/1 (window usable from PLV3).
pub const DMW_PLV3: u32 = 1 << 3;

/// Memory access type field mask in DMW0/1 (bits 5:4).
pub const DMW_MAT: u32 = 0x3 << 4;

/// Bit shift of the physical segment field in DMW0/1.
pub const DMW_PSEG_SHIFT: u32 = 25;

/// Bit shift of the virtual segment field in DMW0/1.
pub const DMW_VSEG_SHIFT: u32 = 29;

/// Writable field mask of DMW0/1.
pub const DMW_WMASK: u32 = 0xEE00_0039;

/// CRMD value after reset: direct address mode, PLV0, interrupts disabled.
pub const CRMD_RESET: u32 = CRMD_DA;

/// Control and Status Register file.
///
/// Single owner of all architectural control state: privilege mode, interrupt
/// enables, the exception record, timer configuration, TLB staging registers,
/// and the direct-mapping windows. The TLB and the timer are satellite stores
/// updated through this file's write path.
///
/// None of the operations here can fault; access legality (privilege checks
/// on CSR instructions) is decided upstream by the exception arbiter.
#[derive(Clone, Debug)]
pub struct CsrFile {
    /// Current mode: privilege level, interrupt enable, translation mode.
    pub crmd: u32,
    /// Previous mode, saved on exception entry.
    pub prmd: u32,
    /// Exception configuration: local interrupt enables.
    pub ecfg: u32,
    /// Exception status: interrupt lines and the latched Ecode/EsubCode.
    pub estat: u32,
    /// Exception return address.
    pub era: u32,
    /// Bad virtual address of the last address-class fault.
    pub badv: u32,
    /// Exception entry address (all classes except TLB refill).
    pub eentry: u32,
    /// TLB index, page size, and "no entry" flag.
    pub tlbidx: u32,
    /// TLB entry high: virtual page-pair number staging.
    pub tlbehi: u32,
    /// TLB entry low, even page.
    pub tlbelo0: u32,
    /// TLB entry low, odd page.
    pub tlbelo1: u32,
    /// Address space identifier.
    pub asid: u32,
    /// Scratch save registers SAVE0..SAVE3.
    pub save: [u32; 4],
    /// Timer identifier, read by RDCNTID.
    pub tid: u32,
    /// Timer configuration: enable, periodic, initial value.
    pub tcfg: u32,
    /// Timer countdown value (read-only to software).
    pub tval: u32,
    /// TLB refill exception entry address.
    pub tlbrentry: u32,
    /// Direct mapping window 0.
    pub dmw0: u32,
    /// Direct mapping window 1.
    pub dmw1: u32,
}

impl CsrFile {
    /// Creates a CSR file in the architectural reset state.
    ///
    /// The core resets into direct address mode at PLV0 with interrupts
    /// disabled; every other register resets to zero.
    pub fn new() -> Self {
        Self {
            crmd: CRMD_RESET,
            prmd: 0,
            ecfg: 0,
            estat: 0,
            era: 0,
            badv: 0,
            eentry: 0,
            tlbidx: 0,
            tlbehi: 0,
            tlbelo0: 0,
            tlbelo1: 0,
            asid: 0,
            save: [0; 4],
            tid: 0,
            tcfg: 0,
            tval: 0,
            tlbrentry: 0,
            dmw0: 0,
            dmw1: 0,
        }
    }

    /// Reads a CSR value by its 14-bit number.
    ///
    /// Unmapped numbers and reserved field positions read as zero; reads have
    /// no side effects.
    pub fn read(&self, num: u16) -> u32 {
        match num {
            CSR_CRMD => self.crmd,
            CSR_PRMD => self.prmd,
            CSR_ECFG => self.ecfg,
            CSR_ESTAT => self.estat,
            CSR_ERA => self.era,
            CSR_BADV => self.badv,
            CSR_EENTRY => self.eentry,
            CSR_TLBIDX => self.tlbidx,
            CSR_TLBEHI => self.tlbehi,
            CSR_TLBELO0 => self.tlbelo0,
            CSR_TLBELO1 => self.tlbelo1,
            CSR_ASID => self.asid | ASID_ASIDBITS,
            CSR_SAVE0 => self.save[0],
            CSR_SAVE1 => self.save[1],
            CSR_SAVE2 => self.save[2],
            CSR_SAVE3 => self.save[3],
            CSR_TID => self.tid,
            CSR_TCFG => self.tcfg,
            CSR_TVAL => self.tval,
            CSR_TICLR => 0,
            CSR_TLBRENTRY => self.tlbrentry,
            CSR_DMW0 => self.dmw0,
            CSR_DMW1 => self.dmw1,
            _ => 0,
        }
    }

    /// Writes a CSR under an instruction-supplied mask.
    ///
    /// `value` lands only where `mask` bits are set, further restricted to
    /// the register's legal field ranges; reserved fields are write-ignored
    /// and illegal numbers are silently dropped. The write is atomic: it is
    /// issued by exactly one committing instruction per cycle, so the net
    /// effect is linearizable with commit order.
    pub fn write(&mut self, num: u16, mask: u32, value: u32) {
        let merge = |old: u32, legal: u32| (old & !(mask & legal)) | (value & mask & legal);

        match num {
            CSR_CRMD => self.crmd = merge(self.crmd, CRMD_PLV | CRMD_IE | CRMD_DA | CRMD_PG | CRMD_DATF | CRMD_DATM),
            CSR_PRMD => self.prmd = merge(self.prmd, PRMD_PPLV | PRMD_PIE),
            CSR_ECFG => self.ecfg = merge(self.ecfg, ECFG_LIE),
            // Only the software interrupt bits are writable; the rest of
            // ESTAT is hardware-owned.
            CSR_ESTAT => self.estat = merge(self.estat, ESTAT_IS_SW),
            CSR_ERA => self.era = merge(self.era, u32::MAX),
            CSR_BADV => self.badv = merge(self.badv, u32::MAX),
            CSR_EENTRY => self.eentry = merge(self.eentry, EENTRY_VA),
            CSR_TLBIDX => {
                let legal = TLBIDX_INDEX | (TLBIDX_PS_MASK << TLBIDX_PS_SHIFT) | TLBIDX_NE;
                self.tlbidx = merge(self.tlbidx, legal);
            }
            CSR_TLBEHI => self.tlbehi = merge(self.tlbehi, TLBEHI_VPPN),
            CSR_TLBELO0 => self.tlbelo0 = merge(self.tlbelo0, TLBELO_WMASK),
            CSR_TLBELO1 => self.tlbelo1 = merge(self.tlbelo1, TLBELO_WMASK),
            CSR_ASID => self.asid = merge(self.asid, ASID_ASID),
            CSR_SAVE0 => self.save[0] = merge(self.save[0], u32::MAX),
            CSR_SAVE1 => self.save[1] = merge(self.save[1], u32::MAX),
            CSR_SAVE2 => self.save[2] = merge(self.save[2], u32::MAX),
            CSR_SAVE3 => self.save[3] = merge(self.save[3], u32::MAX),
            CSR_TID => self.tid = merge(self.tid, u32::MAX),
            CSR_TCFG => {
                self.tcfg = merge(self.tcfg, u32::MAX);
                // Arming the timer loads the countdown from the initial value.
                if self.tcfg & TCFG_EN != 0 {
                    self.tval = self.tcfg >> TCFG_INITV_SHIFT;
                }
            }
            // TVAL is read-only; writes are dropped.
            CSR_TVAL => {}
            CSR_TICLR => {
                if value & mask & TICLR_CLR != 0 {
                    self.estat &= !ESTAT_IS_TIMER;
                }
            }
            CSR_TLBRENTRY => self.tlbrentry = merge(self.tlbrentry, EENTRY_VA),
            CSR_DMW0 => self.dmw0 = merge(self.dmw0, DMW_WMASK),
            CSR_DMW1 => self.dmw1 = merge(self.dmw1, DMW_WMASK),
            _ => {}
        }
    }

    /// Enters an exception: saves mode state, latches the fault record, and
    /// returns the handler entry address.
    ///
    /// Saves CRMD.{PLV,IE} into PRMD, drops to PLV0 with interrupts off,
    /// latches `ecode`/`esubcode` into ESTAT, records `pc` in ERA, and, for
    /// address-class faults, `badv` in BADV. The TLB-refill class
    /// additionally forces direct address mode and stages the faulting VPPN
    /// in TLBEHI so the handler's TLBFILL targets the right entry.
    ///
    /// Returns TLBRENTRY for the refill class, EENTRY for everything else.
    pub fn raise_exception(&mut self, ecode: u8, esubcode: u16, pc: u32, badv: Option<u32>) -> u32 {
        self.prmd = (self.prmd & !(PRMD_PPLV | PRMD_PIE)) | (self.crmd & (CRMD_PLV | CRMD_IE));
        self.crmd &= !(CRMD_PLV | CRMD_IE);

        self.estat = (self.estat & ESTAT_IS)
            | (u32::from(ecode) & ESTAT_ECODE_MASK) << ESTAT_ECODE_SHIFT
            | (u32::from(esubcode) & ESTAT_ESUBCODE_MASK) << ESTAT_ESUBCODE_SHIFT;
        self.era = pc;
        if let Some(addr) = badv {
            self.badv = addr;
        }

        if ecode == ECODE_TLBR {
            self.crmd = (self.crmd | CRMD_DA) & !CRMD_PG;
            if let Some(addr) = badv {
                self.tlbehi = (self.tlbehi & !TLBEHI_VPPN) | (addr & TLBEHI_VPPN);
            }
            self.tlbrentry & EENTRY_VA
        } else {
            self.eentry & EENTRY_VA
        }
    }

    /// Returns from an exception (ERTN): restores mode state and yields the
    /// resume address.
    ///
    /// CRMD.{PLV,IE} are restored from PRMD. If the latched Ecode is the
    /// TLB-refill class, paged translation is re-enabled (the inverse of the
    /// entry-side mode switch). Returns ERA.
    pub fn return_from_exception(&mut self) -> u32 {
        self.crmd = (self.crmd & !(CRMD_PLV | CRMD_IE)) | (self.prmd & (PRMD_PPLV | PRMD_PIE));
        if self.estat_ecode() == ECODE_TLBR {
            self.crmd = (self.crmd & !CRMD_DA) | CRMD_PG;
        }
        self.era
    }

    /// Advances the countdown timer by one cycle.
    ///
    /// While TCFG.EN is set, TVAL decrements once per call; on the tick that
    /// finds it at zero, the timer interrupt bit latches into ESTAT.IS and
    /// the counter reloads from TCFG.INITV (periodic) or the timer disarms
    /// (one-shot). The period is therefore INITV+1 ticks with exactly one
    /// interrupt per period.
    pub fn tick_timer(&mut self) {
        if self.tcfg & TCFG_EN == 0 {
            return;
        }
        if self.tval != 0 {
            self.tval -= 1;
        } else {
            self.estat |= ESTAT_IS_TIMER;
            if self.tcfg & TCFG_PERIOD != 0 {
                self.tval = self.tcfg >> TCFG_INITV_SHIFT;
            } else {
                self.tcfg &= !TCFG_EN;
            }
        }
    }

    /// Whether an enabled interrupt is pending.
    ///
    /// True when CRMD.IE is set and any ESTAT.IS line survives the ECFG.LIE
    /// mask. The pipeline samples this once per cycle at commit.
    pub fn interrupt_pending(&self) -> bool {
        self.crmd & CRMD_IE != 0 && self.estat & self.ecfg & ESTAT_IS & ECFG_LIE != 0
    }

    /// Drives a hardware interrupt line (0..8, ESTAT.IS bits 9:2).
    pub fn set_hw_interrupt(&mut self, line: usize, asserted: bool) {
        let bit = 1u32 << (2 + (line & 7));
        if asserted {
            self.estat |= bit;
        } else {
            self.estat &= !bit;
        }
    }

    /// Current privilege level from CRMD.PLV.
    pub fn plv(&self) -> PrivilegeLevel {
        PrivilegeLevel::from_u8((self.crmd & CRMD_PLV) as u8)
    }

    /// Whether direct address mode is active (CRMD.DA).
    pub fn direct_address_mode(&self) -> bool {
        self.crmd & CRMD_DA != 0
    }

    /// Current address space identifier (ASID.ASID).
    pub fn asid_value(&self) -> u16 {
        (self.asid & ASID_ASID) as u16
    }

    /// The Ecode latched in ESTAT.
    pub fn estat_ecode(&self) -> u8 {
        ((self.estat >> ESTAT_ECODE_SHIFT) & ESTAT_ECODE_MASK) as u8
    }

    /// The index field of TLBIDX.
    pub fn tlbidx_index(&self) -> usize {
        (self.tlbidx & TLBIDX_INDEX) as usize
    }

    /// The page-size field of TLBIDX.
    pub fn tlbidx_ps(&self) -> u32 {
        (self.tlbidx >> TLBIDX_PS_SHIFT) & TLBIDX_PS_MASK
    }

    /// Whether TLBIDX.NE ("no entry") is set.
    pub fn tlbidx_ne(&self) -> bool {
        self.tlbidx & TLBIDX_NE != 0
    }
}

impl Default for CsrFile {
    fn default() -> Self {
        Self::new()
    }
}
