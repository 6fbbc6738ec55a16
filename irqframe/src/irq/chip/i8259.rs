// SPDX-License-Identifier: MPL-2.0

//! The dual 8259 Programmable Interrupt Controller (PIC) of the PC.
//!
//! The master serves lines 0 to 7, the slave lines 8 to 15, and the slave's
//! output is wired to the master's line 2. The mask registers are written as
//! a whole byte from a cached copy.

use bit_field::BitField;
use log::info;
use spin::Mutex;

use super::{AckStatus, IrqChip};
use crate::{
    io::{IoPort, PortIo, ReadWriteAccess, WriteOnlyAccess},
    irq::IrqLine,
};

const MASTER_CMD: IoPort<ReadWriteAccess> = IoPort::new(0x20);
const MASTER_DATA: IoPort<WriteOnlyAccess> = IoPort::new(0x21);
const SLAVE_CMD: IoPort<ReadWriteAccess> = IoPort::new(0xA0);
const SLAVE_DATA: IoPort<WriteOnlyAccess> = IoPort::new(0xA1);

/// The CPU vector of line 0. Lines 0 to 15 use vectors 0x20 to 0x2f.
pub const IRQ_OFFSET: u8 = 0x20;

/// The number of lines served by the pair.
pub const NR_PIC_LINES: usize = 16;

/// The master line the slave is wired to.
pub const CASCADE_LINE: IrqLine = 2;

/// Start initialization, expect ICW4.
const ICW1_INIT: u8 = 0x11;
/// 8086/88 mode, normal EOI.
const ICW4_8086: u8 = 0x01;
/// Non-specific end of interrupt.
const OCW2_EOI: u8 = 0x20;
/// Read the in-service register on the next command port read.
const OCW3_READ_ISR: u8 = 0x0B;
/// Read the request register on the next command port read.
const OCW3_READ_IRR: u8 = 0x0A;

/// Converts a CPU vector into the PIC line it belongs to.
pub fn vector_to_line(vector: u8) -> Option<IrqLine> {
    let line = vector.checked_sub(IRQ_OFFSET)? as IrqLine;
    (line < NR_PIC_LINES).then_some(line)
}

/// One chip of the pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PicRole {
    /// Lines 0 to 7.
    Master,
    /// Lines 8 to 15.
    Slave,
}

impl PicRole {
    /// Gets the chip that serves `line`.
    pub fn of(line: IrqLine) -> Self {
        if line < 8 { Self::Master } else { Self::Slave }
    }

    const fn index(self) -> usize {
        match self {
            Self::Master => 0,
            Self::Slave => 1,
        }
    }

    const fn cmd(self) -> IoPort<ReadWriteAccess> {
        match self {
            Self::Master => MASTER_CMD,
            Self::Slave => SLAVE_CMD,
        }
    }

    const fn data(self) -> IoPort<WriteOnlyAccess> {
        match self {
            Self::Master => MASTER_DATA,
            Self::Slave => SLAVE_DATA,
        }
    }
}

/// The dual 8259 PIC behind a port I/O bus.
pub struct I8259Pic<P> {
    io: P,
    /// Cached masks of the master and the slave. A set bit masks the line.
    masks: Mutex<[u8; 2]>,
}

impl<P: PortIo> I8259Pic<P> {
    /// Creates the controller and programs the pair with every line masked.
    pub fn new(io: P) -> Self {
        let pic = Self {
            io,
            masks: Mutex::new([0xff; 2]),
        };
        pic.init();
        pic
    }

    /// Reprograms the pair, masking every line.
    pub fn init(&self) {
        info!("[PIC]: Initializing with all lines masked");
        let mut masks = self.masks.lock();
        *masks = [0xff; 2];

        MASTER_DATA.write(&self.io, 0xff);
        SLAVE_DATA.write(&self.io, 0xff);

        // - Map master PIC vector 0x00~0x07 to IRQ number 0x20~0x27
        // - The slave is attached to IR2
        MASTER_CMD.write(&self.io, ICW1_INIT);
        MASTER_DATA.write(&self.io, IRQ_OFFSET);
        MASTER_DATA.write(&self.io, 1 << CASCADE_LINE);
        MASTER_DATA.write(&self.io, ICW4_8086);

        // - Map slave PIC vector 0x00~0x07 to IRQ number 0x28~0x2f
        // - The slave's cascade identity is 2
        SLAVE_CMD.write(&self.io, ICW1_INIT);
        SLAVE_DATA.write(&self.io, IRQ_OFFSET + 0x08);
        SLAVE_DATA.write(&self.io, CASCADE_LINE as u8);
        SLAVE_DATA.write(&self.io, ICW4_8086);

        MASTER_DATA.write(&self.io, masks[0]);
        SLAVE_DATA.write(&self.io, masks[1]);
    }

    /// Gets the cached masks of the master and the slave.
    pub fn cached_masks(&self) -> [u8; 2] {
        *self.masks.lock()
    }

    fn set_masked(&self, masks: &mut [u8; 2], line: IrqLine, masked: bool) {
        let role = PicRole::of(line);
        masks[role.index()].set_bit(line % 8, masked);
        role.data().write(&self.io, masks[role.index()]);
    }

    fn in_service(&self, line: IrqLine) -> bool {
        let cmd = PicRole::of(line).cmd();
        cmd.write(&self.io, OCW3_READ_ISR);
        let isr = cmd.read(&self.io);
        cmd.write(&self.io, OCW3_READ_IRR);
        isr.get_bit(line % 8)
    }

    /// Checks the lowest-priority line of each chip, which is where a
    /// request withdrawn before the CPU acknowledged it shows up.
    ///
    /// A spurious request on the slave still went through the master's
    /// cascade input, so the master gets its EOI.
    fn is_spurious(&self, line: IrqLine) -> bool {
        if line % 8 != 7 || self.in_service(line) {
            return false;
        }
        if PicRole::of(line) == PicRole::Slave {
            MASTER_CMD.write(&self.io, OCW2_EOI);
        }
        true
    }

    fn eoi(&self, line: IrqLine) {
        if PicRole::of(line) == PicRole::Slave {
            SLAVE_CMD.write(&self.io, OCW2_EOI);
        }
        MASTER_CMD.write(&self.io, OCW2_EOI);
    }
}

impl<P: PortIo> IrqChip for I8259Pic<P> {
    fn name(&self) -> &'static str {
        "XT-PIC"
    }

    fn enable(&self, line: IrqLine) {
        let mut masks = self.masks.lock();
        self.set_masked(&mut masks, line, false);
    }

    fn disable(&self, line: IrqLine) {
        let mut masks = self.masks.lock();
        self.set_masked(&mut masks, line, true);
    }

    fn ack(&self, line: IrqLine) -> AckStatus {
        let _masks = self.masks.lock();
        if self.is_spurious(line) {
            return AckStatus::Spurious;
        }
        self.eoi(line);
        AckStatus::Acked
    }

    fn mask_and_ack(&self, line: IrqLine) -> AckStatus {
        let mut masks = self.masks.lock();
        // A spurious line is left unmasked; nothing will re-enable it.
        if self.is_spurious(line) {
            return AckStatus::Spurious;
        }
        self.set_masked(&mut masks, line, true);
        self.eoi(line);
        AckStatus::Acked
    }
}
