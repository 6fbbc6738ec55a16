// SPDX-License-Identifier: MPL-2.0

//! The edge-latching GPIO expander of the GraphicsClient board.
//!
//! Sixteen inputs are split into two banks of eight. Each bank has its own
//! edge-select, enable and status registers, and each bank raises one
//! group-edge latch that feeds a single parent line of the SoC.

use bit_field::BitField;
use log::info;
use spin::Mutex;

use super::{AckStatus, EdgeSense, IrqChip};
use crate::{
    Error, Result,
    io::{ReadWriteAccess, Reg, RegisterIo, WriteOnlyAccess},
    irq::{Demultiplexer, IrqLine},
    prelude::*,
};

const NR_BANKS: usize = 2;
const BANK_WIDTH: usize = 8;
const BANK_STRIDE: usize = 0x10;

/// The number of inputs of the expander.
pub const NR_GPIO_LINES: usize = NR_BANKS * BANK_WIDTH;

const RISING: usize = 0x0;
const FALLING: usize = 0x4;
const ENABLE: usize = 0x8;
const STATUS: usize = 0xC;

/// Write-1-to-clear latches of the per-bank group edge seen by the parent.
const GROUP_EDGE: [Reg<WriteOnlyAccess>; NR_BANKS] = [Reg::new(0x20), Reg::new(0x24)];

const fn bank_reg<A>(bank: usize, offset: usize) -> Reg<A> {
    Reg::new(bank * BANK_STRIDE + offset)
}

const fn status_reg(bank: usize) -> Reg<ReadWriteAccess> {
    bank_reg(bank, STATUS)
}

/// Shadow copies of the write-only registers. Bit `i` is input `i`.
#[derive(Default)]
struct Shadow {
    rising: u16,
    falling: u16,
    enabled: u16,
}

/// The GPIO expander as a controller of its sixteen child lines.
pub struct GpioEdgeChip<R> {
    regs: R,
    first_line: IrqLine,
    shadow: Mutex<Shadow>,
}

impl<R: RegisterIo> GpioEdgeChip<R> {
    /// Creates the controller with every input disabled and no edge selected.
    pub fn new(regs: R, first_line: IrqLine) -> Self {
        info!(
            "[GPIO]: lines {}..{} on two edge banks",
            first_line,
            first_line + NR_GPIO_LINES
        );
        let chip = Self {
            regs,
            first_line,
            shadow: Mutex::new(Shadow::default()),
        };
        {
            let shadow = chip.shadow.lock();
            for bank in 0..NR_BANKS {
                chip.write_bank(&shadow, bank);
                status_reg(bank).write(&chip.regs, 0xff);
            }
        }
        chip
    }

    /// Gets the line of input 0.
    pub fn first_line(&self) -> IrqLine {
        self.first_line
    }

    fn input(&self, line: IrqLine) -> usize {
        let input = line - self.first_line;
        debug_assert!(input < NR_GPIO_LINES);
        input
    }

    fn write_bank(&self, shadow: &Shadow, bank: usize) {
        let byte = |bits: u16| bits.get_bits(bank * BANK_WIDTH..(bank + 1) * BANK_WIDTH) as u32;
        bank_reg::<WriteOnlyAccess>(bank, RISING)
            .write(&self.regs, byte(shadow.rising & shadow.enabled));
        bank_reg::<WriteOnlyAccess>(bank, FALLING)
            .write(&self.regs, byte(shadow.falling & shadow.enabled));
        bank_reg::<WriteOnlyAccess>(bank, ENABLE).write(&self.regs, byte(shadow.enabled));
    }

    fn set_enabled(&self, line: IrqLine, enabled: bool) {
        let input = self.input(line);
        let mut shadow = self.shadow.lock();
        shadow.enabled.set_bit(input, enabled);
        self.write_bank(&shadow, input / BANK_WIDTH);
    }

    /// Reads the latched inputs that are enabled.
    fn pending(&self) -> u32 {
        let enabled = self.shadow.lock().enabled as u32;
        let mut latched = 0u32;
        for bank in 0..NR_BANKS {
            let status = status_reg(bank).read(&self.regs) & 0xff;
            latched.set_bits(bank * BANK_WIDTH..(bank + 1) * BANK_WIDTH, status);
        }
        latched & enabled
    }
}

impl<R: RegisterIo> IrqChip for GpioEdgeChip<R> {
    fn name(&self) -> &'static str {
        "GPIO-edge"
    }

    fn enable(&self, line: IrqLine) {
        self.set_enabled(line, true);
    }

    fn disable(&self, line: IrqLine) {
        self.set_enabled(line, false);
    }

    fn ack(&self, line: IrqLine) -> AckStatus {
        self.disable(line);
        let input = self.input(line);
        status_reg(input / BANK_WIDTH).write(&self.regs, 1 << (input % BANK_WIDTH));
        AckStatus::Acked
    }

    fn mask_and_ack(&self, line: IrqLine) -> AckStatus {
        self.ack(line)
    }

    fn set_trigger(&self, line: IrqLine, sense: EdgeSense) -> Result<()> {
        let input = self.input(line);
        let mut shadow = self.shadow.lock();
        if shadow.enabled.get_bit(input) {
            return Err(Error::Busy);
        }
        shadow.rising.set_bit(input, sense.rising);
        shadow.falling.set_bit(input, sense.falling);
        self.write_bank(&shadow, input / BANK_WIDTH);
        Ok(())
    }
}

/// The demultiplexer of the GraphicsClient parent line.
///
/// Both group-edge latches are cleared on every pass, whether or not their
/// bank had anything pending.
pub struct GraphicsClientDemux<R> {
    chip: Arc<GpioEdgeChip<R>>,
}

impl<R> GraphicsClientDemux<R> {
    /// Creates the demultiplexer of `chip`'s inputs.
    pub fn new(chip: Arc<GpioEdgeChip<R>>) -> Self {
        Self { chip }
    }
}

impl<R: RegisterIo> Demultiplexer for GraphicsClientDemux<R> {
    fn name(&self) -> &'static str {
        "graphicsclient"
    }

    fn child_base(&self) -> IrqLine {
        self.chip.first_line
    }

    fn pending(&self) -> u32 {
        self.chip.pending()
    }

    fn ack_parent(&self, _pending: u32) {
        for group in &GROUP_EDGE {
            group.write(&self.chip.regs, 1);
        }
    }
}
