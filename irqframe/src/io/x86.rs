// SPDX-License-Identifier: MPL-2.0

use x86_64::instructions::port::Port;

use super::PortIo;

/// The real x86 I/O port space, accessed with `in`/`out` instructions.
pub struct X86PortIo {
    _private: (),
}

impl X86PortIo {
    /// Creates the port space accessor.
    ///
    /// # Safety
    ///
    /// Port I/O is a privileged operation. The caller must run at a privilege
    /// level that allows it and must own the ports that will be accessed.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PortIo for X86PortIo {
    fn read_u8(&self, port: u16) -> u8 {
        let mut port = Port::<u8>::new(port);
        // SAFETY: The constructor's caller guarantees the privilege to do port I/O.
        unsafe { port.read() }
    }

    fn write_u8(&self, port: u16, value: u8) {
        let mut port = Port::<u8>::new(port);
        // SAFETY: The constructor's caller guarantees the privilege to do port I/O.
        unsafe { port.write(value) }
    }
}
