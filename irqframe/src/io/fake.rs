// SPDX-License-Identifier: MPL-2.0

//! A register block in RAM for the controller tests.

use alloc::collections::BTreeMap;

use spin::Mutex;

use super::RegisterIo;
use crate::prelude::*;

/// Registers that remember their values and every write.
///
/// Registers listed as write-1-to-clear drop the written bits instead of
/// taking the written value, like latched status registers do.
pub(crate) struct FakeRegs {
    values: Mutex<BTreeMap<usize, u32>>,
    writes: Mutex<Vec<(usize, u32)>>,
    w1c: Vec<usize>,
}

impl FakeRegs {
    pub(crate) fn new(w1c: &[usize]) -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(Vec::new()),
            w1c: w1c.to_vec(),
        })
    }

    /// Sets a register as the hardware would, without logging a write.
    pub(crate) fn latch(&self, offset: usize, bits: u32) {
        *self.values.lock().entry(offset).or_insert(0) |= bits;
    }

    pub(crate) fn value(&self, offset: usize) -> u32 {
        self.values.lock().get(&offset).copied().unwrap_or(0)
    }

    pub(crate) fn take_writes(&self) -> Vec<(usize, u32)> {
        core::mem::take(&mut *self.writes.lock())
    }
}

impl RegisterIo for FakeRegs {
    fn read_u32(&self, offset: usize) -> u32 {
        self.value(offset)
    }

    fn write_u32(&self, offset: usize, value: u32) {
        self.writes.lock().push((offset, value));
        let mut values = self.values.lock();
        let slot = values.entry(offset).or_insert(0);
        if self.w1c.contains(&offset) {
            *slot &= !value;
        } else {
            *slot = value;
        }
    }
}
