// SPDX-License-Identifier: MPL-2.0

use log::{debug, error, trace, warn};
use smallvec::SmallVec;

use super::{
    AckStatus, IrqAction, IrqDesc, IrqDescTable, IrqLine, IrqReturn, IrqStatus, cascade,
};
use crate::prelude::*;

/// The outcome of one call to [`IrqDescTable::handle_irq`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The chain (or the demultiplexer) ran until no request was pending.
    Handled,
    /// The line was disabled or busy on another CPU; the request was
    /// recorded as pending.
    Deferred,
    /// The controller reported a request that was not actually pending.
    Spurious,
    /// Requests kept arriving past the redispatch cap; the line was left
    /// enabled and the dispatch gave up looping.
    Stuck,
}

/// The actions of one chain run, taken while the descriptor lock is held.
type ActionSnapshot = SmallVec<[Arc<IrqAction>; 4]>;

impl<const N: usize> IrqDescTable<N> {
    /// Dispatches a request that arrived on `line`.
    ///
    /// This is called by the low-level entry code after the hardware vector
    /// has been decoded into a line, with local interrupts disabled. It may
    /// be entered concurrently for the same line on several CPUs; only one of
    /// them runs the chain while the others leave a pending mark behind.
    ///
    /// # Panics
    ///
    /// Panics if `line` is out of range, has no controller bound, or is
    /// enabled without any action. All of them are platform table bugs.
    pub fn handle_irq(&self, line: IrqLine) -> Dispatch {
        let Some(desc) = self.get(line) else {
            panic!("IRQ {} is outside of the {}-line descriptor table", line, N);
        };
        let chip = desc.chip();
        if !chip.is_bound() {
            panic!("IRQ {} fired but no controller is bound to it", line);
        }

        // Local interrupts are already disabled by the entry code.
        let mut inner = desc.inner.lock();
        if chip.mask_and_ack(line) == AckStatus::Spurious {
            drop(inner);
            self.note_spurious(desc);
            return Dispatch::Spurious;
        }
        desc.counters.inc_count();

        inner.status.remove(IrqStatus::WAITING);
        if inner
            .status
            .intersects(IrqStatus::DISABLED | IrqStatus::INPROGRESS)
        {
            trace!("[IRQ]: line {} deferred, status {:?}", line, inner.status);
            inner.status.insert(IrqStatus::PENDING);
            chip.end(line, inner.status);
            return Dispatch::Deferred;
        }

        let demux = desc.demux();
        if demux.is_none() && inner.actions.is_empty() {
            if inner.status.contains(IrqStatus::PROBE) {
                chip.end(line, inner.status);
                return Dispatch::Deferred;
            }
            panic!("IRQ {} is enabled but has no action", line);
        }

        inner.status.remove(IrqStatus::PENDING);
        inner.status.insert(IrqStatus::INPROGRESS);

        let mut redispatched = 0;
        let outcome = loop {
            let actions: ActionSnapshot = inner.actions.iter().cloned().collect();
            drop(inner);

            match demux {
                Some(demux) => cascade::demultiplex(self, line, demux.as_ref()),
                None => self.run_actions(desc, &actions),
            }

            inner = desc.inner.lock();
            if !inner.status.contains(IrqStatus::PENDING) {
                break Dispatch::Handled;
            }
            inner.status.remove(IrqStatus::PENDING);

            if redispatched == self.config().max_redispatch {
                error!(
                    "[IRQ]: stuck IRQ {}: still pending after {} redispatches",
                    line, redispatched
                );
                desc.counters.inc_stuck();
                break Dispatch::Stuck;
            }
            redispatched += 1;
            trace!("[IRQ]: line {} redispatch #{}", line, redispatched);
        };

        inner.status.remove(IrqStatus::INPROGRESS);
        chip.end(line, inner.status);
        outcome
    }

    fn run_actions(&self, desc: &IrqDesc, actions: &[Arc<IrqAction>]) {
        let line = desc.line();
        let claimed = actions.iter().fold(false, |claimed, action| {
            (action.call(line) == IrqReturn::Handled) | claimed
        });
        if claimed {
            return;
        }

        let unhandled = desc.counters.inc_unhandled();
        let interval = self.config().unhandled_report_interval;
        if interval != 0 && unhandled % interval == 0 {
            error!(
                "[IRQ]: IRQ {}: nobody cared ({} unhandled requests)",
                line, unhandled
            );
            for action in actions {
                error!("[IRQ]:     handler {} ({:?})", action.name(), action.dev_id());
            }
        }
    }

    fn note_spurious(&self, desc: &IrqDesc) {
        let total = self.inc_spurious();
        if desc.counters.inc_spurious() == 1 {
            warn!(
                "[IRQ]: spurious interrupt on line {} ({})",
                desc.line(),
                desc.chip().name()
            );
        } else {
            debug!(
                "[IRQ]: spurious interrupt on line {}, {} in total",
                desc.line(),
                total
            );
        }
    }
}
