// SPDX-License-Identifier: MPL-2.0

//! The interrupt layer of a small kernel.
//!
//! This crate owns the IRQ descriptor table, the drivers of the interrupt
//! controllers found on the supported boards, and the dispatch core that
//! turns a hardware request into calls of the handlers drivers registered.
//!
//! ```rust,ignore
//! let config = irqframe::IrqConfig::from_cmdline(cmdline);
//! let table = irqframe::init(config, console_write);
//! // SAFETY: Nothing else drives the PIC ports.
//! irqframe::platform::pc::init(table, unsafe { X86PortIo::new() })?;
//! ```
#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod config;
mod error;
pub mod io;
pub mod irq;
pub mod logger;
pub mod platform;
pub mod prelude;

pub use self::{config::IrqConfig, error::Error, prelude::Result};
use self::{irq::IrqDescTable, logger::LogSink};

/// Initializes the logger and builds the process-wide descriptor table.
///
/// The controllers are bound afterwards by one of the [`platform`] tables.
pub fn init(config: IrqConfig, log_sink: LogSink) -> &'static IrqDescTable {
    logger::init(config.log_level, log_sink);
    irq::init(config)
}
