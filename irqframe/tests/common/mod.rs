// SPDX-License-Identifier: MPL-2.0

#![expect(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use irqframe::{
    io::{PortIo, RegisterIo},
    irq::{AckStatus, IrqChip, IrqLine, IrqStatus},
};
use spin::Mutex;

/// One observed hardware access, or a marker left by a fake controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(usize, u32),
    Write(usize, u32),
    End(IrqLine),
}

pub type AccessLog = Arc<Mutex<Vec<Access>>>;

/// A register block in RAM. Registers listed as write-1-to-clear drop the
/// written bits.
pub struct FakeRegs {
    values: Mutex<BTreeMap<usize, u32>>,
    w1c: Vec<usize>,
    pub log: AccessLog,
}

impl FakeRegs {
    pub fn new(w1c: &[usize]) -> Arc<Self> {
        Self::with_log(w1c, AccessLog::default())
    }

    pub fn with_log(w1c: &[usize], log: AccessLog) -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(BTreeMap::new()),
            w1c: w1c.to_vec(),
            log,
        })
    }

    /// Raises bits the way the hardware would, without logging.
    pub fn latch(&self, offset: usize, bits: u32) {
        *self.values.lock().entry(offset).or_insert(0) |= bits;
    }

    /// Drops bits the way the hardware would, without logging.
    pub fn clear(&self, offset: usize, bits: u32) {
        *self.values.lock().entry(offset).or_insert(0) &= !bits;
    }

    pub fn value(&self, offset: usize) -> u32 {
        self.values.lock().get(&offset).copied().unwrap_or(0)
    }
}

impl RegisterIo for FakeRegs {
    fn read_u32(&self, offset: usize) -> u32 {
        let value = self.value(offset);
        self.log.lock().push(Access::Read(offset, value));
        value
    }

    fn write_u32(&self, offset: usize, value: u32) {
        self.log.lock().push(Access::Write(offset, value));
        let mut values = self.values.lock();
        let slot = values.entry(offset).or_insert(0);
        if self.w1c.contains(&offset) {
            *slot &= !value;
        } else {
            *slot = value;
        }
    }
}

/// The PC port space with settable in-service registers.
#[derive(Default)]
pub struct FakePorts {
    pub writes: Mutex<Vec<(u16, u8)>>,
    pub isr: Mutex<[u8; 2]>,
}

impl PortIo for FakePorts {
    fn read_u8(&self, port: u16) -> u8 {
        let isr = self.isr.lock();
        match port {
            0x20 => isr[0],
            0xA0 => isr[1],
            _ => 0,
        }
    }

    fn write_u8(&self, port: u16, value: u8) {
        self.writes.lock().push((port, value));
    }
}

/// A CPU-side parent line that only records when it is re-armed.
pub struct ParentChip {
    pub log: AccessLog,
}

impl IrqChip for ParentChip {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn enable(&self, _line: IrqLine) {}

    fn disable(&self, _line: IrqLine) {}

    fn ack(&self, _line: IrqLine) -> AckStatus {
        AckStatus::Acked
    }

    fn end(&self, line: IrqLine, status: IrqStatus) {
        assert!(!status.contains(IrqStatus::INPROGRESS));
        self.log.lock().push(Access::End(line));
    }
}
