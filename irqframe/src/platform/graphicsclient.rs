// SPDX-License-Identifier: MPL-2.0

//! The ADS GraphicsClient, whose GPIO expander raises one SoC line.

use crate::{
    io::RegisterIo,
    irq::{
        IrqChip, IrqDescTable, IrqLine,
        chip::{GpioEdgeChip, GraphicsClientDemux, NR_GPIO_LINES},
    },
    prelude::*,
};

/// Binds `parent` to `parent_line`, the expander to
/// `first_child..first_child + NR_GPIO_LINES`, and chains the children
/// behind the parent.
pub fn init<R, const N: usize>(
    table: &IrqDescTable<N>,
    parent: Arc<dyn IrqChip>,
    parent_line: IrqLine,
    regs: R,
    first_child: IrqLine,
) -> Result<Arc<GpioEdgeChip<R>>>
where
    R: RegisterIo + 'static,
{
    table.set_controller(parent_line, parent)?;

    let gpio = Arc::new(GpioEdgeChip::new(regs, first_child));
    for line in first_child..first_child + NR_GPIO_LINES {
        table.set_controller(line, gpio.clone())?;
        table.set_valid(line, true)?;
    }

    table.set_chained_handler(parent_line, Arc::new(GraphicsClientDemux::new(gpio.clone())))?;
    Ok(gpio)
}
