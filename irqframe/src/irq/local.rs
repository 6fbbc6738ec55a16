// SPDX-License-Identifier: MPL-2.0

//! Masking of interrupts on the current CPU.
//!
//! A lock that the dispatch core takes in interrupt context must be taken
//! with local interrupts disabled everywhere else. Otherwise a request
//! arriving on the same CPU while the lock is held spins on it forever.

use core::marker::PhantomData;

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(all(target_arch = "x86_64", target_os = "none"))] {
        use x86_64::instructions::interrupts;

        pub(crate) fn is_local_enabled() -> bool {
            interrupts::are_enabled()
        }

        fn enable_local() {
            interrupts::enable();
        }

        fn mask_local() {
            interrupts::disable();
        }
    } else if #[cfg(test)] {
        extern crate std;

        use core::cell::Cell;

        // Each test thread stands in for one CPU.
        std::thread_local! {
            static LOCAL_ENABLED: Cell<bool> = const { Cell::new(true) };
        }

        pub(crate) fn is_local_enabled() -> bool {
            LOCAL_ENABLED.with(Cell::get)
        }

        fn enable_local() {
            LOCAL_ENABLED.with(|enabled| enabled.set(true));
        }

        fn mask_local() {
            LOCAL_ENABLED.with(|enabled| enabled.set(false));
        }
    } else {
        // Hosted builds receive no hardware interrupts.
        pub(crate) fn is_local_enabled() -> bool {
            false
        }

        fn enable_local() {}

        fn mask_local() {}
    }
}

/// Disables all interrupts on the current CPU until the guard is dropped.
///
/// Guards nest: only the outermost one enables interrupts again, and only if
/// they were enabled when it was taken.
pub fn disable_local() -> DisabledLocalIrqGuard {
    DisabledLocalIrqGuard::new()
}

/// A guard for disabled local IRQs.
#[must_use]
pub struct DisabledLocalIrqGuard {
    was_enabled: bool,
    // The guard belongs to the CPU that created it.
    _not_send: PhantomData<*const ()>,
}

impl DisabledLocalIrqGuard {
    fn new() -> Self {
        let was_enabled = is_local_enabled();
        if was_enabled {
            mask_local();
        }
        Self {
            was_enabled,
            _not_send: PhantomData,
        }
    }
}

impl Drop for DisabledLocalIrqGuard {
    fn drop(&mut self) {
        if self.was_enabled {
            enable_local();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nested_guards_restore_outermost_state() {
        assert!(is_local_enabled());
        let outer = disable_local();
        assert!(!is_local_enabled());
        {
            let _inner = disable_local();
            assert!(!is_local_enabled());
        }
        assert!(!is_local_enabled());
        drop(outer);
        assert!(is_local_enabled());
    }
}
