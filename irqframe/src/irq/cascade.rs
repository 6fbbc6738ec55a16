// SPDX-License-Identifier: MPL-2.0

use log::trace;

use super::{IrqDescTable, IrqLine};

/// The secondary controller behind a cascaded parent line.
///
/// A demultiplexer reports which of up to 32 children are pending as a bit
/// mask. Child `i` is the line `child_base() + i`. Children are ordinary lines
/// with their own controller bindings and actions.
pub trait Demultiplexer: Send + Sync {
    /// Gets a short name for log messages.
    fn name(&self) -> &'static str;

    /// Gets the line of child 0.
    fn child_base(&self) -> IrqLine;

    /// Reads the secondary status registers.
    fn pending(&self) -> u32;

    /// Clears the parent's latched request before the children in `pending`
    /// are dispatched.
    fn ack_parent(&self, pending: u32);
}

/// Dispatches the children of `parent` until a poll finds none pending.
///
/// An edge-triggered parent may merge several child events into a single
/// edge, and new children can fire while earlier ones are handled. Returning
/// after one read would drop them, so the loop only ends on a zero poll. The
/// caller re-arms the parent afterwards.
pub(super) fn demultiplex<const N: usize>(
    table: &IrqDescTable<N>,
    parent: IrqLine,
    demux: &dyn Demultiplexer,
) {
    let base = demux.child_base();
    let mut polls = 0usize;
    loop {
        let pending = demux.pending();
        polls += 1;
        if pending == 0 {
            break;
        }
        demux.ack_parent(pending);

        let mut remaining = pending;
        while remaining != 0 {
            let bit = remaining.trailing_zeros() as usize;
            table.handle_irq(base + bit);
            remaining &= remaining - 1;
        }
    }
    trace!("[IRQ]: {} on line {} drained in {} polls", demux.name(), parent, polls);
}

#[cfg(test)]
mod test {
    use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use spin::Mutex;

    use super::*;
    use crate::{
        config::IrqConfig,
        irq::{AckStatus, DevId, Dispatch, IrqChip, IrqFlags, IrqReturn, IrqStatus},
        prelude::*,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Poll(u32),
        AckParent(u32),
        Child(IrqLine),
        ParentEnd,
    }

    type Trace = Arc<Mutex<Vec<Event>>>;

    /// A status register that the test scripts poll by poll.
    struct ScriptedDemux {
        status: AtomicU32,
        trace: Trace,
    }

    impl Demultiplexer for ScriptedDemux {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn child_base(&self) -> IrqLine {
            8
        }

        fn pending(&self) -> u32 {
            let status = self.status.load(Ordering::SeqCst);
            self.trace.lock().push(Event::Poll(status));
            status
        }

        fn ack_parent(&self, pending: u32) {
            self.trace.lock().push(Event::AckParent(pending));
        }
    }

    /// Acking a child clears its bit in the demultiplexer's status.
    struct ChildChip {
        demux: Arc<ScriptedDemux>,
    }

    impl IrqChip for ChildChip {
        fn name(&self) -> &'static str {
            "child"
        }

        fn enable(&self, _line: IrqLine) {}

        fn disable(&self, _line: IrqLine) {}

        fn ack(&self, line: IrqLine) -> AckStatus {
            self.demux
                .status
                .fetch_and(!(1 << (line - 8)), Ordering::SeqCst);
            AckStatus::Acked
        }
    }

    struct ParentChip {
        trace: Trace,
    }

    impl IrqChip for ParentChip {
        fn name(&self) -> &'static str {
            "parent"
        }

        fn enable(&self, _line: IrqLine) {}

        fn disable(&self, _line: IrqLine) {}

        fn ack(&self, _line: IrqLine) -> AckStatus {
            AckStatus::Acked
        }

        fn end(&self, _line: IrqLine, status: IrqStatus) {
            assert!(!status.contains(IrqStatus::INPROGRESS));
            self.trace.lock().push(Event::ParentEnd);
        }
    }

    #[test]
    fn drains_until_zero_poll() {
        let table = Arc::new(IrqDescTable::<16>::new(IrqConfig::default()));
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let demux = Arc::new(ScriptedDemux {
            status: AtomicU32::new(1 << 3),
            trace: trace.clone(),
        });
        table
            .set_controller(
                1,
                Arc::new(ParentChip {
                    trace: trace.clone(),
                }),
            )
            .unwrap();
        let child_chip = Arc::new(ChildChip {
            demux: demux.clone(),
        });
        for line in 8..16 {
            table.set_controller(line, child_chip.clone()).unwrap();
        }
        table.set_chained_handler(1, demux.clone()).unwrap();

        let child3 = Arc::new(AtomicUsize::new(0));
        let child7 = Arc::new(AtomicUsize::new(0));
        {
            let (count, demux, trace) = (child3.clone(), demux.clone(), trace.clone());
            table
                .request_irq(
                    11,
                    move |line| {
                        trace.lock().push(Event::Child(line));
                        // Children 3 and 7 fire while child 3 is handled.
                        if count.fetch_add(1, Ordering::SeqCst) == 0 {
                            demux.status.fetch_or((1 << 3) | (1 << 7), Ordering::SeqCst);
                        }
                        IrqReturn::Handled
                    },
                    IrqFlags::empty(),
                    "child3",
                    DevId(3),
                )
                .unwrap();
        }
        {
            let (count, trace) = (child7.clone(), trace.clone());
            table
                .request_irq(
                    15,
                    move |line| {
                        trace.lock().push(Event::Child(line));
                        count.fetch_add(1, Ordering::SeqCst);
                        IrqReturn::Handled
                    },
                    IrqFlags::empty(),
                    "child7",
                    DevId(7),
                )
                .unwrap();
        }

        assert_eq!(table.handle_irq(1), Dispatch::Handled);

        assert!(child3.load(Ordering::SeqCst) >= 1);
        assert_eq!(child7.load(Ordering::SeqCst), 1);

        let trace = trace.lock();
        let last_poll = trace
            .iter()
            .rposition(|e| matches!(e, Event::Poll(_)))
            .unwrap();
        assert_eq!(trace[last_poll], Event::Poll(0));
        assert_eq!(trace.last(), Some(&Event::ParentEnd));
        assert_eq!(
            trace.iter().filter(|e| **e == Event::ParentEnd).count(),
            1
        );
        assert_eq!(
            *trace,
            [
                Event::Poll(1 << 3),
                Event::AckParent(1 << 3),
                Event::Child(11),
                Event::Poll((1 << 3) | (1 << 7)),
                Event::AckParent((1 << 3) | (1 << 7)),
                Event::Child(11),
                Event::Child(15),
                Event::Poll(0),
                Event::ParentEnd,
            ]
        );
    }

    #[test]
    fn chained_parent_rejects_actions() {
        let table = IrqDescTable::<16>::new(IrqConfig::default());
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        table
            .set_controller(
                2,
                Arc::new(ParentChip {
                    trace: trace.clone(),
                }),
            )
            .unwrap();
        let demux = Arc::new(ScriptedDemux {
            status: AtomicU32::new(0),
            trace,
        });
        table.set_chained_handler(2, demux.clone()).unwrap();
        assert!(table.get(2).unwrap().is_chained());
        assert_eq!(
            table.request_irq(2, |_| IrqReturn::Handled, IrqFlags::SHARED, "x", DevId(0)),
            Err(crate::Error::AlreadyInUse)
        );
        assert_eq!(
            table.set_chained_handler(2, demux),
            Err(crate::Error::AlreadyBound)
        );
    }
}
