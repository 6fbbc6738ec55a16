// SPDX-License-Identifier: MPL-2.0

//! The ARM Integrator with its level-triggered interrupt controller.

use log::error;

use crate::{
    io::RegisterIo,
    irq::{IrqDescTable, chip::LevelChip},
    prelude::*,
};

/// The number of interrupt sources of the board.
pub const NR_INTEGRATOR_LINES: usize = 22;

/// Binds the controller to lines `0..NR_INTEGRATOR_LINES`.
pub fn init<R, const N: usize>(table: &IrqDescTable<N>, regs: R) -> Result<Arc<LevelChip<R>>>
where
    R: RegisterIo + 'static,
{
    let chip = Arc::new(LevelChip::new(regs, 0, NR_INTEGRATOR_LINES));
    for line in 0..NR_INTEGRATOR_LINES {
        table.set_controller(line, chip.clone())?;
        table.set_valid(line, true)?;
    }
    Ok(chip)
}

/// Dispatches every asserted source until the status register reads zero.
///
/// A source whose handler never services its device keeps the register
/// non-zero, so the status is polled at most `max_redispatch + 1` times.
///
/// Returns the number of requests dispatched.
pub fn handle_pending<R, const N: usize>(table: &IrqDescTable<N>, chip: &LevelChip<R>) -> usize
where
    R: RegisterIo,
{
    let mut dispatched = 0;
    for _ in 0..=table.config().max_redispatch {
        let mut status = chip.pending();
        if status == 0 {
            return dispatched;
        }
        while status != 0 {
            let bit = status.trailing_zeros() as usize;
            table.handle_irq(chip.first_line() + bit);
            dispatched += 1;
            status &= status - 1;
        }
    }

    let stuck = chip.pending();
    if stuck != 0 {
        error!(
            "[INTEGRATOR]: stuck sources {:#x} after {} polls",
            stuck,
            table.config().max_redispatch + 1
        );
    }
    dispatched
}
