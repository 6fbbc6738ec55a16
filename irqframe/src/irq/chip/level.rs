// SPDX-License-Identifier: MPL-2.0

use log::info;

use super::{AckStatus, IrqChip};
use crate::{
    io::{ReadOnlyAccess, Reg, RegisterIo, WriteOnlyAccess},
    irq::IrqLine,
};

const STATUS: Reg<ReadOnlyAccess> = Reg::new(0x00);
const ENABLE_SET: Reg<WriteOnlyAccess> = Reg::new(0x08);
const ENABLE_CLEAR: Reg<WriteOnlyAccess> = Reg::new(0x0C);

/// A controller of up to 32 level-triggered sources with set/clear enable
/// registers, as found on the ARM Integrator.
///
/// The source holds its level until the driver services the device, so
/// acknowledging is just masking.
pub struct LevelChip<R> {
    regs: R,
    first_line: IrqLine,
    nr_lines: usize,
}

impl<R: RegisterIo> LevelChip<R> {
    /// Creates the controller of lines `first_line..first_line + nr_lines`
    /// with every source masked.
    ///
    /// # Panics
    ///
    /// Panics if `nr_lines` exceeds 32.
    pub fn new(regs: R, first_line: IrqLine, nr_lines: usize) -> Self {
        assert!(nr_lines <= 32, "a level chip has at most 32 sources");
        info!(
            "[LEVEL]: lines {}..{} masked",
            first_line,
            first_line + nr_lines
        );
        ENABLE_CLEAR.write(&regs, u32::MAX);
        Self {
            regs,
            first_line,
            nr_lines,
        }
    }

    /// Gets the line of source 0.
    pub fn first_line(&self) -> IrqLine {
        self.first_line
    }

    /// Gets the number of sources.
    pub fn nr_lines(&self) -> usize {
        self.nr_lines
    }

    /// Reads the enabled sources that are asserted. Bit `i` is the line
    /// `first_line() + i`.
    pub fn pending(&self) -> u32 {
        STATUS.read(&self.regs)
    }

    fn bit(&self, line: IrqLine) -> u32 {
        let source = line - self.first_line;
        debug_assert!(source < self.nr_lines);
        1 << source
    }
}

impl<R: RegisterIo> IrqChip for LevelChip<R> {
    fn name(&self) -> &'static str {
        "level"
    }

    fn enable(&self, line: IrqLine) {
        ENABLE_SET.write(&self.regs, self.bit(line));
    }

    fn disable(&self, line: IrqLine) {
        ENABLE_CLEAR.write(&self.regs, self.bit(line));
    }

    fn ack(&self, line: IrqLine) -> AckStatus {
        self.disable(line);
        AckStatus::Acked
    }

    fn mask_and_ack(&self, line: IrqLine) -> AckStatus {
        self.ack(line)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{io::fake::FakeRegs, irq::IrqStatus};

    #[test]
    fn set_and_clear_registers() {
        let regs = FakeRegs::new(&[]);
        let chip = LevelChip::new(regs.clone(), 32, 22);
        assert_eq!(regs.take_writes(), [(0x0C, u32::MAX)]);

        chip.enable(35);
        assert_eq!(chip.mask_and_ack(35), AckStatus::Acked);
        chip.end(35, IrqStatus::empty());
        chip.end(35, IrqStatus::DISABLED);
        assert_eq!(
            regs.take_writes(),
            [(0x08, 1 << 3), (0x0C, 1 << 3), (0x08, 1 << 3)]
        );
    }
}
