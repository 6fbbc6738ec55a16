// SPDX-License-Identifier: MPL-2.0

use core::fmt::Debug;

use bitflags::bitflags;
use log::{debug, warn};

use super::{IrqDescTable, IrqLine, IrqStatus};
use crate::{Error, prelude::*};

/// Type alias for the IRQ handler callback.
pub type IrqHandler = dyn Fn(IrqLine) -> IrqReturn + Send + Sync + 'static;

/// What a handler reports about a request.
///
/// The value only feeds the accounting of requests nobody claimed. It never
/// causes a retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IrqReturn {
    /// The handler's device did not raise the request.
    None,
    /// The handler's device raised the request and it has been serviced.
    Handled,
}

bitflags! {
    /// Options of an [`IrqAction`].
    pub struct IrqFlags: u32 {
        /// The line may be shared with other shareable actions.
        const SHARED = 1 << 0;
    }
}

/// An opaque cookie identifying the device that owns an action.
///
/// Shared lines carry several actions; [`free_irq`] uses the cookie to pick
/// the one to remove.
///
/// [`free_irq`]: super::IrqDescTable::free_irq
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DevId(pub usize);

/// A driver callback attached to an IRQ line.
pub struct IrqAction {
    handler: Box<IrqHandler>,
    flags: IrqFlags,
    name: &'static str,
    dev_id: DevId,
}

impl IrqAction {
    pub(super) fn new(
        handler: Box<IrqHandler>,
        flags: IrqFlags,
        name: &'static str,
        dev_id: DevId,
    ) -> Self {
        Self {
            handler,
            flags,
            name,
            dev_id,
        }
    }

    /// Gets the owner name given at registration.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Gets the device cookie given at registration.
    pub fn dev_id(&self) -> DevId {
        self.dev_id
    }

    /// Gets the flags given at registration.
    pub fn flags(&self) -> IrqFlags {
        self.flags
    }

    /// Returns whether the action tolerates other actions on its line.
    pub fn is_shared(&self) -> bool {
        self.flags.contains(IrqFlags::SHARED)
    }

    pub(super) fn call(&self, line: IrqLine) -> IrqReturn {
        (self.handler)(line)
    }
}

impl Debug for IrqAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IrqAction")
            .field("name", &self.name)
            .field("dev_id", &self.dev_id)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl<const N: usize> IrqDescTable<N> {
    /// Attaches `handler` to `line`.
    ///
    /// Actions run in registration order. The first action attached to an
    /// idle line starts the line up on its controller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLine`] if `line` is out of range or unbound,
    /// and [`Error::AlreadyInUse`] if the line is a cascade parent, holds a
    /// non-shareable action, or is occupied and `flags` lacks
    /// [`IrqFlags::SHARED`].
    pub fn request_irq<F>(
        &self,
        line: IrqLine,
        handler: F,
        flags: IrqFlags,
        name: &'static str,
        dev_id: DevId,
    ) -> Result<()>
    where
        F: Fn(IrqLine) -> IrqReturn + Send + Sync + 'static,
    {
        let desc = self.bound_desc(line)?;
        if desc.is_chained() {
            return Err(Error::AlreadyInUse);
        }
        let action = Arc::new(IrqAction::new(Box::new(handler), flags, name, dev_id));

        let mut inner = desc.lock_irq_disabled();
        if let Some(old) = inner.actions.first() {
            if !(old.is_shared() && action.is_shared()) {
                debug!(
                    "[IRQ]: {} cannot join line {} held by {}",
                    name,
                    line,
                    old.name()
                );
                return Err(Error::AlreadyInUse);
            }
        }

        let first = inner.actions.is_empty();
        inner.actions.push(action);
        if first {
            inner.status.remove(
                IrqStatus::DISABLED
                    | IrqStatus::PROBE
                    | IrqStatus::WAITING
                    | IrqStatus::INPROGRESS
                    | IrqStatus::PENDING,
            );
            inner.depth = 0;
            if desc.chip().startup(line) {
                debug!("[IRQ]: line {} was pending at startup", line);
            }
        }
        debug!("[IRQ]: {} attached to line {}", name, line);
        Ok(())
    }

    /// Detaches the action of `dev_id` from `line`.
    ///
    /// Removing the last action shuts the line down. The caller must have
    /// quiesced its device: a handler already running on another CPU still
    /// completes after this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLine`] if `line` is out of range or unbound,
    /// and [`Error::NotFound`] if no action of `dev_id` is attached.
    pub fn free_irq(&self, line: IrqLine, dev_id: DevId) -> Result<()> {
        let desc = self.bound_desc(line)?;
        let mut inner = desc.lock_irq_disabled();
        let Some(index) = inner.actions.iter().position(|a| a.dev_id() == dev_id) else {
            warn!("[IRQ]: trying to free free IRQ {}", line);
            return Err(Error::NotFound);
        };

        let action = inner.actions.remove(index);
        if inner.actions.is_empty() {
            inner.status.insert(IrqStatus::DISABLED);
            inner.depth = 1;
            desc.chip().shutdown(line);
        }
        debug!("[IRQ]: {} detached from line {}", action.name(), line);
        Ok(())
    }
}
