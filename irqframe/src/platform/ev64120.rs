// SPDX-License-Identifier: MPL-2.0

//! The Galileo EV64120 evaluation board.
//!
//! The PCI agents share the CPU lines [`PCI_PARENT_LINES`] and get the
//! logical lines from [`AGENT_LINE_BASE`] on.

use log::info;

use crate::{
    io::RegisterIo,
    irq::{
        IrqChip, IrqDescTable, IrqLine,
        chip::{NR_AGENTS, SharedLineChip, SharedLineDemux},
    },
    prelude::*,
};

/// The CPU lines of physical PCI lines 0 and 1.
pub const PCI_PARENT_LINES: [IrqLine; 2] = [2, 3];

/// The logical line of PCI agent 0.
pub const AGENT_LINE_BASE: IrqLine = 8;

/// Binds `cpu` to the parent lines, the PCI routing to the agent lines,
/// and chains each physical line to the agents `route` assigns to it.
pub fn init<R, const N: usize>(
    table: &IrqDescTable<N>,
    cpu: Arc<dyn IrqChip>,
    regs: R,
    route: u32,
) -> Result<Arc<SharedLineChip<R>>>
where
    R: RegisterIo + 'static,
{
    let pci = Arc::new(SharedLineChip::new(regs, AGENT_LINE_BASE, route));
    for line in AGENT_LINE_BASE..AGENT_LINE_BASE + NR_AGENTS {
        table.set_controller(line, pci.clone())?;
        table.set_valid(line, true)?;
    }

    for (physical, &parent) in PCI_PARENT_LINES.iter().enumerate() {
        table.set_controller(parent, cpu.clone())?;
        table.set_chained_handler(parent, Arc::new(SharedLineDemux::new(pci.clone(), physical)))?;
    }
    info!(
        "[EV64120]: {} PCI agents behind lines {:?}",
        NR_AGENTS, PCI_PARENT_LINES
    );
    Ok(pci)
}
