// SPDX-License-Identifier: MPL-2.0

use core::sync::atomic::{AtomicUsize, Ordering};

/// A snapshot of the counters of one IRQ line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IrqStats {
    /// Requests that were acknowledged as real.
    pub count: usize,
    /// Requests the controller reported but that were not actually pending.
    pub spurious: usize,
    /// Chain runs in which no action claimed the request.
    pub unhandled: usize,
    /// Dispatches that hit the redispatch cap.
    pub stuck: usize,
}

#[derive(Debug, Default)]
pub(super) struct IrqCounters {
    count: AtomicUsize,
    spurious: AtomicUsize,
    unhandled: AtomicUsize,
    stuck: AtomicUsize,
}

impl IrqCounters {
    pub(super) const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            spurious: AtomicUsize::new(0),
            unhandled: AtomicUsize::new(0),
            stuck: AtomicUsize::new(0),
        }
    }

    pub(super) fn inc_count(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the new spurious count.
    pub(super) fn inc_spurious(&self) -> usize {
        self.spurious.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the new unhandled count.
    pub(super) fn inc_unhandled(&self) -> usize {
        self.unhandled.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(super) fn inc_stuck(&self) {
        self.stuck.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> IrqStats {
        IrqStats {
            count: self.count.load(Ordering::Relaxed),
            spurious: self.spurious.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            stuck: self.stuck.load(Ordering::Relaxed),
        }
    }
}
