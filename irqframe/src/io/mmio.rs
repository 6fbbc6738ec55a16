// SPDX-License-Identifier: MPL-2.0

use core::{marker::PhantomData, ptr::NonNull};

use volatile::VolatilePtr;

use super::{ReadAccess, WriteAccess};
use crate::prelude::*;

/// A block of 32-bit registers addressed by byte offset.
///
/// Narrower hardware registers (such as the 8-bit GPIO banks) are accessed
/// through the low bits of a 32-bit slot.
pub trait RegisterIo: Send + Sync {
    /// Reads the register at `offset`.
    fn read_u32(&self, offset: usize) -> u32;

    /// Writes the register at `offset`.
    fn write_u32(&self, offset: usize, value: u32);
}

impl<T: RegisterIo + ?Sized> RegisterIo for &T {
    fn read_u32(&self, offset: usize) -> u32 {
        (**self).read_u32(offset)
    }

    fn write_u32(&self, offset: usize, value: u32) {
        (**self).write_u32(offset, value)
    }
}

impl<T: RegisterIo + ?Sized> RegisterIo for Arc<T> {
    fn read_u32(&self, offset: usize) -> u32 {
        (**self).read_u32(offset)
    }

    fn write_u32(&self, offset: usize, value: u32) {
        (**self).write_u32(offset, value)
    }
}

/// A register at a fixed offset inside a [`RegisterIo`] block.
pub struct Reg<A> {
    offset: usize,
    access_marker: PhantomData<A>,
}

impl<A> Reg<A> {
    /// Creates a register description.
    pub const fn new(offset: usize) -> Self {
        Self {
            offset,
            access_marker: PhantomData,
        }
    }

    /// Gets the byte offset of the register.
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl<A: ReadAccess> Reg<A> {
    /// Reads the register.
    #[inline]
    pub fn read<R: RegisterIo + ?Sized>(&self, regs: &R) -> u32 {
        regs.read_u32(self.offset)
    }
}

impl<A: WriteAccess> Reg<A> {
    /// Writes the register.
    #[inline]
    pub fn write<R: RegisterIo + ?Sized>(&self, regs: &R, value: u32) {
        regs.write_u32(self.offset, value)
    }
}

/// Memory-mapped registers accessed with volatile loads and stores.
pub struct MmioRegisters {
    base: NonNull<u32>,
    len: usize,
}

// SAFETY: The registers are device memory. Every access is a single volatile
// load or store, and the controllers serialize read-modify-write sequences
// with their own locks.
unsafe impl Send for MmioRegisters {}
// SAFETY: See the `Send` implementation above.
unsafe impl Sync for MmioRegisters {}

impl MmioRegisters {
    /// Creates a register block of `len` bytes starting at virtual address `base`.
    ///
    /// Returns `None` if `base` is null or not 4-byte aligned.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `base..base + len` is mapped device memory
    /// owned exclusively by the returned object for its whole lifetime.
    pub unsafe fn new(base: usize, len: usize) -> Option<Self> {
        if base % 4 != 0 {
            return None;
        }
        let base = NonNull::new(base as *mut u32)?;
        Some(Self { base, len })
    }

    fn slot(&self, offset: usize) -> NonNull<u32> {
        assert!(
            offset % 4 == 0 && offset + 4 <= self.len,
            "register offset {:#x} outside of the {:#x}-byte block",
            offset,
            self.len
        );
        // SAFETY: The offset is aligned and inside the block checked above.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset / 4)) }
    }
}

impl RegisterIo for MmioRegisters {
    fn read_u32(&self, offset: usize) -> u32 {
        // SAFETY: `slot` returns an aligned pointer into the device memory
        // that the constructor's caller guarantees to be valid.
        unsafe { VolatilePtr::new(self.slot(offset)) }.read()
    }

    fn write_u32(&self, offset: usize, value: u32) {
        // SAFETY: Same as `read_u32`.
        unsafe { VolatilePtr::new(self.slot(offset)) }.write(value)
    }
}
