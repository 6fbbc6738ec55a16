// SPDX-License-Identifier: MPL-2.0

//! Autoprobing of IRQ lines.
//!
//! A driver that does not know which line its device is wired to starts a
//! probe, makes the device raise an interrupt, waits a little and ends the
//! probe. The line that fired in between is the device's line.

use bitvec::vec::BitVec;
use log::debug;

use super::{IrqDescTable, IrqLine, IrqStatus};

/// The result of an autoprobe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// No probed line fired.
    None,
    /// Exactly one probed line fired.
    Found(IrqLine),
    /// Several probed lines fired; the lowest one is reported.
    Multiple(IrqLine),
}

impl<const N: usize> IrqDescTable<N> {
    /// Starts probing every valid line that has no action.
    ///
    /// The probed lines are unmasked on their controllers but stay
    /// disabled, so a request on one of them is acknowledged and recorded
    /// without running anything. Returns the set of probed lines.
    pub fn probe_irq_on(&self) -> BitVec {
        let mut probed = BitVec::repeat(false, N);
        for line in 0..N {
            let Some(desc) = self.get(line) else {
                continue;
            };
            if !desc.chip().is_bound() || desc.is_chained() {
                continue;
            }

            let mut inner = desc.lock_irq_disabled();
            if !inner.actions.is_empty() || !inner.status.contains(IrqStatus::VALID) {
                continue;
            }
            inner.status.insert(IrqStatus::PROBE | IrqStatus::WAITING);
            if desc.chip().startup(line) {
                inner.status.insert(IrqStatus::PENDING);
            }
            probed.set(line, true);
        }
        debug!("[IRQ]: probing {} lines", probed.count_ones());
        probed
    }

    /// Ends a probe started by [`probe_irq_on`] and reports which lines fired.
    ///
    /// Every line in `probed` is shut down again.
    ///
    /// [`probe_irq_on`]: Self::probe_irq_on
    pub fn probe_irq_off(&self, probed: &BitVec) -> Probe {
        let mut found = Probe::None;
        for line in probed.iter_ones() {
            let Some(desc) = self.get(line) else {
                continue;
            };
            let mut inner = desc.lock_irq_disabled();
            if !inner.status.contains(IrqStatus::PROBE) {
                continue;
            }

            if !inner.status.contains(IrqStatus::WAITING) {
                found = match found {
                    Probe::None => Probe::Found(line),
                    Probe::Found(first) | Probe::Multiple(first) => Probe::Multiple(first),
                };
            }
            inner.status.remove(IrqStatus::PROBE | IrqStatus::WAITING);
            desc.chip().shutdown(line);
        }
        debug!("[IRQ]: probe result {:?}", found);
        found
    }
}
