// SPDX-License-Identifier: MPL-2.0

use core::{
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicUsize, Ordering},
};

use bitflags::bitflags;
use log::{debug, info, warn};
use spin::{Mutex, MutexGuard, Once};

use super::{
    EdgeSense, IrqAction, IrqLine, NR_IRQS,
    cascade::Demultiplexer,
    chip::{IrqChip, NoIrqChip},
    local::{DisabledLocalIrqGuard, disable_local},
    stats::{IrqCounters, IrqStats},
};
use crate::{Error, config::IrqConfig, prelude::*};

bitflags! {
    /// The software status of an IRQ line.
    pub struct IrqStatus: u32 {
        /// The line is disabled by the depth-counted API or has no action.
        const DISABLED = 1 << 0;
        /// The action chain of the line is running on some CPU.
        const INPROGRESS = 1 << 1;
        /// A request arrived while the line could not run its chain.
        const PENDING = 1 << 2;
        /// The line is physically wired and may be autoprobed.
        const VALID = 1 << 3;
        /// The line is being autoprobed.
        const PROBE = 1 << 4;
        /// The probed line has not fired yet.
        const WAITING = 1 << 5;
    }
}

static NO_IRQ_CHIP: NoIrqChip = NoIrqChip;

/// The descriptor of one IRQ line.
pub struct IrqDesc {
    line: IrqLine,
    chip: Once<Arc<dyn IrqChip>>,
    demux: Once<Arc<dyn Demultiplexer>>,
    pub(super) inner: Mutex<DescInner>,
    pub(super) counters: IrqCounters,
}

pub(super) struct DescInner {
    pub(super) status: IrqStatus,
    pub(super) depth: u32,
    pub(super) actions: Vec<Arc<IrqAction>>,
}

/// The descriptor lock, held with local interrupts disabled.
pub(super) struct DescGuard<'a> {
    // Released before interrupts are enabled again.
    inner: MutexGuard<'a, DescInner>,
    _irq: DisabledLocalIrqGuard,
}

impl Deref for DescGuard<'_> {
    type Target = DescInner;

    fn deref(&self) -> &DescInner {
        &self.inner
    }
}

impl DerefMut for DescGuard<'_> {
    fn deref_mut(&mut self) -> &mut DescInner {
        &mut self.inner
    }
}

impl IrqDesc {
    fn new(line: IrqLine) -> Self {
        Self {
            line,
            chip: Once::new(),
            demux: Once::new(),
            inner: Mutex::new(DescInner {
                status: IrqStatus::DISABLED,
                depth: 1,
                actions: Vec::new(),
            }),
            counters: IrqCounters::new(),
        }
    }

    /// Locks the descriptor from task context.
    ///
    /// The dispatch core takes the same lock in interrupt context, so local
    /// interrupts stay disabled while it is held.
    pub(super) fn lock_irq_disabled(&self) -> DescGuard<'_> {
        let irq = disable_local();
        DescGuard {
            inner: self.inner.lock(),
            _irq: irq,
        }
    }

    /// Gets the line number.
    pub fn line(&self) -> IrqLine {
        self.line
    }

    /// Gets the controller bound to the line, or the [`NoIrqChip`] stub.
    pub fn chip(&self) -> &dyn IrqChip {
        match self.chip.get() {
            Some(chip) => chip.as_ref(),
            None => &NO_IRQ_CHIP,
        }
    }

    pub(super) fn demux(&self) -> Option<&Arc<dyn Demultiplexer>> {
        self.demux.get()
    }

    /// Returns whether the line fans out to child lines.
    pub fn is_chained(&self) -> bool {
        self.demux.is_completed()
    }

    /// Gets the current status.
    pub fn status(&self) -> IrqStatus {
        self.lock_irq_disabled().status
    }

    /// Gets the current disable depth.
    pub fn depth(&self) -> u32 {
        self.lock_irq_disabled().depth
    }

    /// Gets the number of actions attached to the line.
    pub fn action_count(&self) -> usize {
        self.lock_irq_disabled().actions.len()
    }

    /// Gets a snapshot of the line's counters.
    pub fn stats(&self) -> IrqStats {
        self.counters.snapshot()
    }
}

/// The table of IRQ descriptors.
///
/// The table has a fixed number of entries, each independently locked, so
/// looking up a line during dispatch never allocates or searches.
pub struct IrqDescTable<const N: usize = NR_IRQS> {
    descs: [IrqDesc; N],
    config: IrqConfig,
    spurious: AtomicUsize,
}

impl<const N: usize> IrqDescTable<N> {
    /// Creates a table whose lines are all disabled and unbound.
    pub fn new(config: IrqConfig) -> Self {
        debug!(
            "[IRQ]: {} descriptors, redispatch cap {}",
            N, config.max_redispatch
        );
        Self {
            descs: core::array::from_fn(IrqDesc::new),
            config,
            spurious: AtomicUsize::new(0),
        }
    }

    /// Gets the configuration the table was built with.
    pub fn config(&self) -> &IrqConfig {
        &self.config
    }

    /// Gets the descriptor of `line`.
    pub fn get(&self, line: IrqLine) -> Option<&IrqDesc> {
        self.descs.get(line)
    }

    /// Gets the descriptor of `line` if a real controller is bound to it.
    pub(super) fn bound_desc(&self, line: IrqLine) -> Result<&IrqDesc> {
        match self.descs.get(line) {
            Some(desc) if desc.chip().is_bound() => Ok(desc),
            _ => Err(Error::InvalidLine),
        }
    }

    /// Gets the status of `line`.
    pub fn status(&self, line: IrqLine) -> Option<IrqStatus> {
        self.get(line).map(IrqDesc::status)
    }

    /// Gets a snapshot of the counters of `line`.
    pub fn stats(&self, line: IrqLine) -> Option<IrqStats> {
        self.get(line).map(IrqDesc::stats)
    }

    /// Gets the number of spurious requests seen on all lines.
    pub fn spurious_count(&self) -> usize {
        self.spurious.load(Ordering::Relaxed)
    }

    /// Returns the new spurious count.
    pub(super) fn inc_spurious(&self) -> usize {
        self.spurious.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Binds `chip` to `line`.
    ///
    /// Bindings are part of the platform bring-up and cannot be changed
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLine`] if `line` is out of range and
    /// [`Error::AlreadyBound`] if a controller was bound before.
    pub fn set_controller(&self, line: IrqLine, chip: Arc<dyn IrqChip>) -> Result<()> {
        let desc = self.get(line).ok_or(Error::InvalidLine)?;
        if desc.chip.is_completed() {
            return Err(Error::AlreadyBound);
        }
        debug!("[IRQ]: line {} bound to {}", line, chip.name());
        desc.chip.call_once(|| chip);
        Ok(())
    }

    /// Turns `line` into the parent of a cascade.
    ///
    /// The line is started up immediately; its requests are handed to
    /// `demux` instead of an action chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLine`] if `line` is unbound,
    /// [`Error::AlreadyInUse`] if actions are attached to it, and
    /// [`Error::AlreadyBound`] if it already has a demultiplexer.
    pub fn set_chained_handler(&self, line: IrqLine, demux: Arc<dyn Demultiplexer>) -> Result<()> {
        let desc = self.bound_desc(line)?;
        let mut inner = desc.lock_irq_disabled();
        if !inner.actions.is_empty() {
            return Err(Error::AlreadyInUse);
        }
        if desc.demux.is_completed() {
            return Err(Error::AlreadyBound);
        }

        info!(
            "[IRQ]: line {} demultiplexed by {} onto lines from {}",
            line,
            demux.name(),
            demux.child_base()
        );
        desc.demux.call_once(|| demux);
        inner
            .status
            .remove(IrqStatus::DISABLED | IrqStatus::PROBE | IrqStatus::WAITING);
        inner.depth = 0;
        if desc.chip().startup(line) {
            debug!("[IRQ]: cascade line {} was pending at startup", line);
            inner.status.insert(IrqStatus::PENDING);
        }
        Ok(())
    }

    /// Programs the edges `line` latches on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if the line is enabled, since reprogramming an
    /// armed edge detector may latch a phantom edge, and
    /// [`Error::InvalidArgs`] if the controller cannot do it.
    pub fn set_edge_sense(&self, line: IrqLine, sense: EdgeSense) -> Result<()> {
        let desc = self.bound_desc(line)?;
        let inner = desc.lock_irq_disabled();
        if inner.depth == 0 {
            return Err(Error::Busy);
        }
        desc.chip().set_trigger(line, sense)
    }

    /// Marks whether `line` is physically wired.
    pub fn set_valid(&self, line: IrqLine, valid: bool) -> Result<()> {
        let desc = self.get(line).ok_or(Error::InvalidLine)?;
        desc.lock_irq_disabled().status.set(IrqStatus::VALID, valid);
        Ok(())
    }

    /// Disables `line` without waiting for running handlers.
    ///
    /// Calls nest: the line is unmasked again only after as many
    /// [`enable_irq`] calls.
    ///
    /// [`enable_irq`]: Self::enable_irq
    pub fn disable_irq_nosync(&self, line: IrqLine) -> Result<()> {
        let desc = self.bound_desc(line)?;
        let mut inner = desc.lock_irq_disabled();
        if inner.depth == 0 {
            inner.status.insert(IrqStatus::DISABLED);
            desc.chip().disable(line);
        }
        inner.depth += 1;
        Ok(())
    }

    /// Disables `line` and waits until no CPU runs its handlers.
    ///
    /// Must not be called from a handler of `line`, which would wait for
    /// itself.
    pub fn disable_irq(&self, line: IrqLine) -> Result<()> {
        self.disable_irq_nosync(line)?;
        let desc = &self.descs[line];
        while desc.lock_irq_disabled().status.contains(IrqStatus::INPROGRESS) {
            core::hint::spin_loop();
        }
        Ok(())
    }

    /// Undoes one [`disable_irq`] or [`disable_irq_nosync`].
    ///
    /// An enable without a matching disable is reported and ignored.
    ///
    /// [`disable_irq`]: Self::disable_irq
    /// [`disable_irq_nosync`]: Self::disable_irq_nosync
    pub fn enable_irq(&self, line: IrqLine) -> Result<()> {
        let desc = self.bound_desc(line)?;
        let mut inner = desc.lock_irq_disabled();
        match inner.depth {
            0 => warn!("[IRQ]: enable_irq({}) unbalanced", line),
            1 => {
                inner.status.remove(IrqStatus::DISABLED);
                inner.depth = 0;
                desc.chip().enable(line);
            }
            _ => inner.depth -= 1,
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use core::sync::atomic::AtomicBool;

    use super::*;
    use crate::irq::{AckStatus, DevId, IrqFlags, IrqReturn, local::is_local_enabled};

    /// A chip that records the masking state of eight lines.
    struct MaskChip {
        mask: Mutex<u8>,
        triggers: Mutex<Vec<(IrqLine, EdgeSense)>>,
        /// Whether local IRQs were enabled during the last unmask.
        unmasked_with_irqs: AtomicBool,
    }

    impl MaskChip {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                mask: Mutex::new(0xff),
                triggers: Mutex::new(Vec::new()),
                unmasked_with_irqs: AtomicBool::new(true),
            })
        }

        fn is_masked(&self, line: IrqLine) -> bool {
            *self.mask.lock() & (1 << line) != 0
        }
    }

    impl IrqChip for MaskChip {
        fn name(&self) -> &'static str {
            "mask"
        }

        fn enable(&self, line: IrqLine) {
            self.unmasked_with_irqs
                .store(is_local_enabled(), Ordering::SeqCst);
            *self.mask.lock() &= !(1 << line);
        }

        fn disable(&self, line: IrqLine) {
            *self.mask.lock() |= 1 << line;
        }

        fn ack(&self, _line: IrqLine) -> AckStatus {
            AckStatus::Acked
        }

        fn set_trigger(&self, line: IrqLine, sense: EdgeSense) -> Result<()> {
            self.triggers.lock().push((line, sense));
            Ok(())
        }
    }

    fn table_with_chip() -> (IrqDescTable<8>, Arc<MaskChip>) {
        let table = IrqDescTable::<8>::new(IrqConfig::default());
        let chip = MaskChip::new();
        for line in 0..8 {
            table.set_controller(line, chip.clone()).unwrap();
        }
        (table, chip)
    }

    fn armed(table: &IrqDescTable<8>, chip: &MaskChip, line: IrqLine) -> (bool, bool, u32) {
        (
            chip.is_masked(line),
            table.status(line).unwrap().contains(IrqStatus::DISABLED),
            table.get(line).unwrap().depth(),
        )
    }

    #[test]
    fn new_lines_are_disabled_and_unbound() {
        let table = IrqDescTable::<4>::new(IrqConfig::default());
        let desc = table.get(3).unwrap();
        assert_eq!(desc.status(), IrqStatus::DISABLED);
        assert_eq!(desc.depth(), 1);
        assert!(!desc.chip().is_bound());
        assert!(table.get(4).is_none());
    }

    #[test]
    fn controller_binds_once() {
        let (table, chip) = table_with_chip();
        assert_eq!(table.set_controller(0, chip.clone()), Err(Error::AlreadyBound));
        assert_eq!(table.set_controller(8, chip), Err(Error::InvalidLine));
        assert_eq!(table.get(0).unwrap().chip().name(), "mask");
    }

    #[test]
    fn nested_disable_balances() {
        for n in [1, 2, 5] {
            let (table, chip) = table_with_chip();
            table
                .request_irq(4, |_| IrqReturn::Handled, IrqFlags::empty(), "nest", DevId(0))
                .unwrap();

            table.disable_irq(4).unwrap();
            table.enable_irq(4).unwrap();
            let single_pair = armed(&table, &chip, 4);

            for _ in 0..n {
                table.disable_irq(4).unwrap();
                assert!(chip.is_masked(4));
            }
            for i in 0..n {
                assert!(chip.is_masked(4), "unmasked after {} of {} enables", i, n);
                table.enable_irq(4).unwrap();
            }
            assert_eq!(armed(&table, &chip, 4), single_pair);
            assert_eq!(single_pair, (false, false, 0));
        }
    }

    #[test]
    fn chip_runs_with_local_irqs_disabled() {
        let (table, chip) = table_with_chip();
        table
            .request_irq(3, |_| IrqReturn::Handled, IrqFlags::empty(), "local", DevId(0))
            .unwrap();
        assert!(!chip.unmasked_with_irqs.load(Ordering::SeqCst));
        assert!(is_local_enabled());

        table.disable_irq_nosync(3).unwrap();
        chip.unmasked_with_irqs.store(true, Ordering::SeqCst);
        table.enable_irq(3).unwrap();
        assert!(!chip.unmasked_with_irqs.load(Ordering::SeqCst));
        assert!(is_local_enabled());
    }

    #[test]
    fn unbalanced_enable_is_ignored() {
        let (table, chip) = table_with_chip();
        table
            .request_irq(1, |_| IrqReturn::Handled, IrqFlags::empty(), "unbal", DevId(0))
            .unwrap();
        table.enable_irq(1).unwrap();
        assert_eq!(armed(&table, &chip, 1), (false, false, 0));
        table.disable_irq_nosync(1).unwrap();
        assert_eq!(armed(&table, &chip, 1), (true, true, 1));
    }

    #[test]
    fn unbound_lines_reject_depth_changes() {
        let table = IrqDescTable::<4>::new(IrqConfig::default());
        assert_eq!(table.disable_irq(2), Err(Error::InvalidLine));
        assert_eq!(table.enable_irq(9), Err(Error::InvalidLine));
    }

    #[test]
    fn edge_sense_requires_masked_line() {
        let (table, chip) = table_with_chip();
        table.set_edge_sense(2, EdgeSense::FALLING).unwrap();
        table
            .request_irq(2, |_| IrqReturn::Handled, IrqFlags::empty(), "edge", DevId(0))
            .unwrap();
        assert_eq!(table.set_edge_sense(2, EdgeSense::RISING), Err(Error::Busy));
        assert_eq!(*chip.triggers.lock(), [(2, EdgeSense::FALLING)]);
    }

    /// A parent whose request is already latched when it starts up.
    struct LatchedChip;

    impl IrqChip for LatchedChip {
        fn name(&self) -> &'static str {
            "latched"
        }

        fn startup(&self, _line: IrqLine) -> bool {
            true
        }

        fn enable(&self, _line: IrqLine) {}

        fn disable(&self, _line: IrqLine) {}

        fn ack(&self, _line: IrqLine) -> AckStatus {
            AckStatus::Acked
        }
    }

    struct IdleDemux;

    impl Demultiplexer for IdleDemux {
        fn name(&self) -> &'static str {
            "idle"
        }

        fn child_base(&self) -> IrqLine {
            4
        }

        fn pending(&self) -> u32 {
            0
        }

        fn ack_parent(&self, _pending: u32) {}
    }

    #[test]
    fn cascade_parent_keeps_request_latched_at_startup() {
        let table = IrqDescTable::<8>::new(IrqConfig::default());
        table.set_controller(0, Arc::new(LatchedChip)).unwrap();
        table.set_chained_handler(0, Arc::new(IdleDemux)).unwrap();

        let status = table.status(0).unwrap();
        assert!(status.contains(IrqStatus::PENDING));
        assert!(!status.contains(IrqStatus::DISABLED));
        assert_eq!(
            table.set_chained_handler(0, Arc::new(IdleDemux)),
            Err(Error::AlreadyBound)
        );
    }

    #[test]
    fn valid_flag_toggles() {
        let (table, _chip) = table_with_chip();
        table.set_valid(5, true).unwrap();
        assert!(table.status(5).unwrap().contains(IrqStatus::VALID));
        table.set_valid(5, false).unwrap();
        assert!(!table.status(5).unwrap().contains(IrqStatus::VALID));
        assert_eq!(table.set_valid(8, true), Err(Error::InvalidLine));
    }
}
