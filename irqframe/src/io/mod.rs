// SPDX-License-Identifier: MPL-2.0

//! Hardware register access.
//!
//! Controllers never touch hardware directly. They go through two narrow
//! traits: [`PortIo`] for the byte-wide x86 I/O space and [`RegisterIo`] for a
//! block of 32-bit registers addressed by byte offset. The typed wrappers
//! [`IoPort`] and [`Reg`] carry an access marker, so reading a write-only mask
//! register is a compile error rather than a silent bus fault.

#[cfg(test)]
pub(crate) mod fake;
mod io_port;
mod mmio;

use cfg_if::cfg_if;

pub use self::{
    io_port::{IoPort, PortIo},
    mmio::{MmioRegisters, Reg, RegisterIo},
};

cfg_if! {
    if #[cfg(all(target_arch = "x86_64", target_os = "none"))] {
        mod x86;

        pub use self::x86::X86PortIo;
    }
}

/// Access marker of a register that can only be read.
pub struct ReadOnlyAccess;
/// Access marker of a register that can only be written.
pub struct WriteOnlyAccess;
/// Access marker of a register that can be both read and written.
pub struct ReadWriteAccess;

/// Marks access types that permit reads.
pub trait ReadAccess {}
/// Marks access types that permit writes.
pub trait WriteAccess {}

impl ReadAccess for ReadOnlyAccess {}
impl ReadAccess for ReadWriteAccess {}
impl WriteAccess for WriteOnlyAccess {}
impl WriteAccess for ReadWriteAccess {}
