// SPDX-License-Identifier: MPL-2.0

use core::marker::PhantomData;

use super::{ReadAccess, WriteAccess};
use crate::prelude::*;

/// The byte-wide I/O port space of x86.
pub trait PortIo: Send + Sync {
    /// Reads one byte from `port`.
    fn read_u8(&self, port: u16) -> u8;

    /// Writes one byte to `port`.
    fn write_u8(&self, port: u16, value: u8);
}

impl<T: PortIo + ?Sized> PortIo for &T {
    fn read_u8(&self, port: u16) -> u8 {
        (**self).read_u8(port)
    }

    fn write_u8(&self, port: u16, value: u8) {
        (**self).write_u8(port, value)
    }
}

impl<T: PortIo + ?Sized> PortIo for Arc<T> {
    fn read_u8(&self, port: u16) -> u8 {
        (**self).read_u8(port)
    }

    fn write_u8(&self, port: u16, value: u8) {
        (**self).write_u8(port, value)
    }
}

/// An I/O port, representing a specific address in the I/O space of x86.
///
/// The access marker decides whether [`read`] and [`write`] exist:
///
/// ```rust
/// use irqframe::io::{IoPort, PortIo, WriteOnlyAccess};
///
/// const MASTER_CMD: IoPort<WriteOnlyAccess> = IoPort::new(0x20);
///
/// fn start_init(io: &dyn PortIo) {
///     MASTER_CMD.write(io, 0x11);
/// }
/// ```
///
/// [`read`]: Self::read
/// [`write`]: Self::write
pub struct IoPort<A> {
    port: u16,
    access_marker: PhantomData<A>,
}

impl<A> IoPort<A> {
    /// Creates an I/O port.
    pub const fn new(port: u16) -> Self {
        Self {
            port,
            access_marker: PhantomData,
        }
    }

    /// Gets the port number.
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl<A: ReadAccess> IoPort<A> {
    /// Reads from the I/O port.
    #[inline]
    pub fn read<P: PortIo + ?Sized>(&self, io: &P) -> u8 {
        io.read_u8(self.port)
    }
}

impl<A: WriteAccess> IoPort<A> {
    /// Writes to the I/O port.
    #[inline]
    pub fn write<P: PortIo + ?Sized>(&self, io: &P, value: u8) {
        io.write_u8(self.port, value)
    }
}
