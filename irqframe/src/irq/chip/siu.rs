// SPDX-License-Identifier: MPL-2.0

//! The System Interface Unit (SIU) interrupt controller of the MPC8xx.
//!
//! The SIU prioritizes its sources and reports the winner through a vector
//! register. Sources are numbered big-endian: source `n` is bit `31 - n` of
//! the pending, mask and edge registers.

use bit_field::BitField;
use log::info;
use spin::Mutex;

use super::{AckStatus, EdgeSense, IrqChip};
use crate::{
    Error, Result,
    io::{ReadOnlyAccess, ReadWriteAccess, Reg, RegisterIo},
    irq::IrqLine,
};

/// The number of SIU sources: external pins IRQ0..IRQ7 interleaved with
/// internal levels LVL0..LVL7.
pub const NR_SIU_LINES: usize = 16;

/// The code SIVEC reports when no source is pending.
const SIVEC_NONE: usize = 15;

const SIPEND: Reg<ReadWriteAccess> = Reg::new(0x10);
const SIMASK: Reg<ReadWriteAccess> = Reg::new(0x14);
const SIEL: Reg<ReadWriteAccess> = Reg::new(0x18);
const SIVEC: Reg<ReadOnlyAccess> = Reg::new(0x1C);

fn reg_bit(line: IrqLine) -> usize {
    // All sources live in the first register word.
    debug_assert_eq!(line >> 5, 0);
    31 - (line & 0x1f)
}

/// The SIU behind its register block, serving lines `0..NR_SIU_LINES`.
pub struct SiuChip<R> {
    regs: R,
    /// Cached SIMASK. A set bit enables the source.
    mask: Mutex<u32>,
}

impl<R: RegisterIo> SiuChip<R> {
    /// Creates the controller with every source masked.
    pub fn new(regs: R) -> Self {
        info!("[SIU]: Initializing with all sources masked");
        SIMASK.write(&regs, 0);
        Self {
            regs,
            mask: Mutex::new(0),
        }
    }

    /// Decodes SIVEC into the highest-priority pending line.
    pub fn pending_line(&self) -> Option<IrqLine> {
        let code = (SIVEC.read(&self.regs) >> 26) as usize;
        (code != SIVEC_NONE).then_some(code)
    }

    /// Gets the cached mask register.
    pub fn cached_mask(&self) -> u32 {
        *self.mask.lock()
    }

    fn set_enabled(&self, line: IrqLine, enabled: bool) {
        let mut mask = self.mask.lock();
        mask.set_bit(reg_bit(line), enabled);
        SIMASK.write(&self.regs, *mask);
    }
}

impl<R: RegisterIo> IrqChip for SiuChip<R> {
    fn name(&self) -> &'static str {
        "SIU"
    }

    fn enable(&self, line: IrqLine) {
        self.set_enabled(line, true);
    }

    fn disable(&self, line: IrqLine) {
        self.set_enabled(line, false);
    }

    /// Clears the latch of an edge-mode pin. Level sources ignore the write.
    fn ack(&self, line: IrqLine) -> AckStatus {
        SIPEND.write(&self.regs, 1 << reg_bit(line));
        AckStatus::Acked
    }

    fn mask_and_ack(&self, line: IrqLine) -> AckStatus {
        let mut mask = self.mask.lock();
        mask.set_bit(reg_bit(line), false);
        SIMASK.write(&self.regs, *mask);
        SIPEND.write(&self.regs, 1 << reg_bit(line));
        AckStatus::Acked
    }

    /// Selects falling-edge mode for [`EdgeSense::FALLING`] and level mode
    /// for [`EdgeSense::NONE`]. Only the external pins, the even lines, can
    /// be switched, and they cannot detect rising edges.
    fn set_trigger(&self, line: IrqLine, sense: EdgeSense) -> Result<()> {
        if line % 2 != 0 || sense.rising {
            return Err(Error::InvalidArgs);
        }
        let _mask = self.mask.lock();
        let mut siel = SIEL.read(&self.regs);
        siel.set_bit(reg_bit(line), sense.falling);
        SIEL.write(&self.regs, siel);
        Ok(())
    }
}
