// SPDX-License-Identifier: MPL-2.0

//! The PC with its dual 8259 PIC.

use log::info;

use crate::{
    io::PortIo,
    irq::{
        DevId, Dispatch, IrqDescTable, IrqFlags, IrqReturn,
        chip::{CASCADE_LINE, I8259Pic, NR_PIC_LINES, vector_to_line},
    },
    prelude::*,
};

/// The device ID of the action that keeps the cascade input open.
pub const CASCADE_DEV_ID: DevId = DevId(usize::MAX);

/// Binds the PIC to lines 0 to 15 and opens the cascade input.
///
/// Every line except the cascade is marked valid for autoprobing.
pub fn init<P, const N: usize>(table: &IrqDescTable<N>, io: P) -> Result<Arc<I8259Pic<P>>>
where
    P: PortIo + 'static,
{
    let pic = Arc::new(I8259Pic::new(io));
    for line in 0..NR_PIC_LINES {
        table.set_controller(line, pic.clone())?;
        table.set_valid(line, line != CASCADE_LINE)?;
    }
    // Slave requests arrive on their own vectors. The action only keeps the
    // master's input unmasked.
    table.request_irq(
        CASCADE_LINE,
        |_| IrqReturn::None,
        IrqFlags::empty(),
        "cascade",
        CASCADE_DEV_ID,
    )?;
    info!("[PC]: {} PIC lines bound", NR_PIC_LINES);
    Ok(pic)
}

/// Dispatches the request behind a CPU vector.
///
/// Returns `None` if the vector does not belong to the PIC.
pub fn handle_vector<const N: usize>(table: &IrqDescTable<N>, vector: u8) -> Option<Dispatch> {
    vector_to_line(vector).map(|line| table.handle_irq(line))
}
