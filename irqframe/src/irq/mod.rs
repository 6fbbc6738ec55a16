// SPDX-License-Identifier: MPL-2.0

//! Handling of Interrupt ReQuests (IRQs).
//!
//! # Lines, descriptors and controllers
//!
//! Every interrupt source has a stable logical number, its [`IrqLine`].
//! The [`IrqDescTable`] maps each line to an [`IrqDesc`], which records
//! the [`IrqChip`] the line is wired to, the line's status and nesting depth,
//! and the ordered chain of [`IrqAction`]s drivers registered on it.
//!
//! The table is built once at boot with every line masked and bound to the
//! [`NoIrqChip`] stub. Platform bring-up code then binds real controllers with
//! [`IrqDescTable::set_controller`], and drivers attach handlers with
//! [`IrqDescTable::request_irq`].
//!
//! # Dispatch
//!
//! The low-level entry code decodes the hardware vector into a line and calls
//! [`IrqDescTable::handle_irq`]. The dispatch core acknowledges the
//! controller, runs the action chain with the descriptor lock released, and
//! finally lets the controller re-arm the line. A request that arrives while
//! the chain is already running on another CPU is recorded as pending and the
//! running CPU executes the chain once more, so no request is lost and no
//! chain runs twice at the same time.
//!
//! # Cascades
//!
//! A line can aggregate many child lines behind a secondary status register.
//! Such a line carries a [`Demultiplexer`] instead of actions; the dispatch
//! core polls it until no child is pending and dispatches each child as an
//! ordinary line.

mod action;
mod cascade;
pub mod chip;
mod desc;
mod dispatch;
pub(crate) mod local;
mod probe;
mod stats;

use spin::Once;

pub use self::{
    action::{DevId, IrqAction, IrqFlags, IrqHandler, IrqReturn},
    cascade::Demultiplexer,
    chip::{AckStatus, EdgeSense, IrqChip, NoIrqChip},
    desc::{IrqDesc, IrqDescTable, IrqStatus},
    dispatch::Dispatch,
    local::{DisabledLocalIrqGuard, disable_local},
    probe::Probe,
    stats::IrqStats,
};
use crate::{Result, config::IrqConfig};

/// A logical interrupt line number, in `0..NR_IRQS`.
pub type IrqLine = usize;

/// The number of lines in the process-wide descriptor table.
pub const NR_IRQS: usize = 64;

static IRQ_DESC_TABLE: Once<IrqDescTable> = Once::new();

/// Builds the process-wide descriptor table.
///
/// Must be called once during boot, before interrupts are enabled. Later
/// calls return the table built by the first one and ignore `config`.
pub fn init(config: IrqConfig) -> &'static IrqDescTable {
    IRQ_DESC_TABLE.call_once(|| IrqDescTable::new(config))
}

/// Gets the process-wide descriptor table.
///
/// # Panics
///
/// Panics if [`init`] has not been called.
pub fn table() -> &'static IrqDescTable {
    match IRQ_DESC_TABLE.get() {
        Some(table) => table,
        None => panic!("the IRQ descriptor table is used before `irq::init`"),
    }
}

/// Attaches `handler` to `line` of the process-wide table.
///
/// See [`IrqDescTable::request_irq`].
pub fn request_irq<F>(
    line: IrqLine,
    handler: F,
    flags: IrqFlags,
    name: &'static str,
    dev_id: DevId,
) -> Result<()>
where
    F: Fn(IrqLine) -> IrqReturn + Send + Sync + 'static,
{
    table().request_irq(line, handler, flags, name, dev_id)
}

/// Detaches the action of `dev_id` from `line` of the process-wide table.
pub fn free_irq(line: IrqLine, dev_id: DevId) -> Result<()> {
    table().free_irq(line, dev_id)
}

/// Disables `line` of the process-wide table and waits for running handlers.
pub fn disable_irq(line: IrqLine) -> Result<()> {
    table().disable_irq(line)
}

/// Disables `line` of the process-wide table without waiting.
pub fn disable_irq_nosync(line: IrqLine) -> Result<()> {
    table().disable_irq_nosync(line)
}

/// Undoes one [`disable_irq`] on `line` of the process-wide table.
pub fn enable_irq(line: IrqLine) -> Result<()> {
    table().enable_irq(line)
}

/// Dispatches a request on `line` of the process-wide table.
///
/// Must be called with local interrupts disabled.
pub fn handle_irq(line: IrqLine) -> Dispatch {
    table().handle_irq(line)
}
