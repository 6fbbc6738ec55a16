// SPDX-License-Identifier: MPL-2.0

//! The MPC8xx family with its SIU controller.

use crate::{
    io::RegisterIo,
    irq::{
        Dispatch, IrqDescTable,
        chip::{NR_SIU_LINES, SiuChip},
    },
    prelude::*,
};

/// Binds the SIU to lines `0..NR_SIU_LINES`.
pub fn init<R, const N: usize>(table: &IrqDescTable<N>, regs: R) -> Result<Arc<SiuChip<R>>>
where
    R: RegisterIo + 'static,
{
    let siu = Arc::new(SiuChip::new(regs));
    for line in 0..NR_SIU_LINES {
        table.set_controller(line, siu.clone())?;
        table.set_valid(line, true)?;
    }
    Ok(siu)
}

/// Dispatches the highest-priority request the SIU reports.
///
/// Returns `None` if nothing is pending.
pub fn handle_pending<R, const N: usize>(
    table: &IrqDescTable<N>,
    siu: &SiuChip<R>,
) -> Option<Dispatch>
where
    R: RegisterIo,
{
    siu.pending_line().map(|line| table.handle_irq(line))
}
