// SPDX-License-Identifier: MPL-2.0

/// The error type which is returned from the APIs of this crate.
///
/// Configuration mistakes that can only come from a broken platform table
/// (dispatching an unbound line, an enabled line without any action) are not
/// represented here. They panic before interrupts are enabled.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    /// The line is out of range or has no controller bound to it.
    InvalidLine,
    /// The line is occupied in a way that forbids the new registration.
    AlreadyInUse,
    /// No action with the given device ID is registered on the line.
    NotFound,
    /// A controller has already been bound to the line.
    AlreadyBound,
    /// The line is armed and the requested change is unsafe.
    Busy,
    /// The controller does not support the requested operation or argument.
    InvalidArgs,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::InvalidLine => "invalid IRQ line",
            Error::AlreadyInUse => "IRQ line already in use",
            Error::NotFound => "no such IRQ action",
            Error::AlreadyBound => "IRQ controller already bound",
            Error::Busy => "IRQ line is armed",
            Error::InvalidArgs => "invalid arguments",
        };
        f.write_str(msg)
    }
}
