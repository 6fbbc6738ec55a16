// SPDX-License-Identifier: MPL-2.0

//! Interrupt controllers.
//!
//! An [`IrqChip`] is the hardware side of an IRQ line: it masks, unmasks and
//! acknowledges the line. One chip instance usually serves many lines, so
//! every method receives the line it operates on. Chips that sit behind
//! write-only mask registers keep a shadow copy of the mask and never read it
//! back from the hardware.

mod gpio_edge;
mod i8259;
mod level;
mod shared_line;
mod siu;

pub use self::{
    gpio_edge::{GpioEdgeChip, GraphicsClientDemux, NR_GPIO_LINES},
    i8259::{CASCADE_LINE, I8259Pic, IRQ_OFFSET, NR_PIC_LINES, PicRole, vector_to_line},
    level::LevelChip,
    shared_line::{NR_AGENTS, SharedLineChip, SharedLineDemux},
    siu::{NR_SIU_LINES, SiuChip},
};
use super::{IrqLine, IrqStatus};
use crate::{Error, Result};

/// The outcome of acknowledging a line on its controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum AckStatus {
    /// The latched request was real and has been cleared.
    Acked,
    /// The controller reported a request that, upon verification, was not
    /// actually pending.
    Spurious,
}

/// The edges on which an edge-sensing line latches a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EdgeSense {
    /// Latch on a low-to-high transition.
    pub rising: bool,
    /// Latch on a high-to-low transition.
    pub falling: bool,
}

impl EdgeSense {
    /// Rising edges only.
    pub const RISING: Self = Self {
        rising: true,
        falling: false,
    };
    /// Falling edges only.
    pub const FALLING: Self = Self {
        rising: false,
        falling: true,
    };
    /// Both edges.
    pub const BOTH: Self = Self {
        rising: true,
        falling: true,
    };
    /// No edge; the line never latches.
    pub const NONE: Self = Self {
        rising: false,
        falling: false,
    };
}

/// The hardware operations of an interrupt controller.
///
/// The dispatch core calls [`mask_and_ack`] when a request arrives and
/// [`end`] when the handlers are done. Drivers reach [`enable`] and
/// [`disable`] only through the depth-counted descriptor API, and
/// [`startup`]/[`shutdown`] are called when the first action is attached
/// and the last one is removed.
///
/// All methods run with the descriptor lock of `line` held and local
/// interrupts disabled. Handlers run with local interrupts disabled too.
///
/// [`mask_and_ack`]: Self::mask_and_ack
/// [`end`]: Self::end
/// [`enable`]: Self::enable
/// [`disable`]: Self::disable
/// [`startup`]: Self::startup
/// [`shutdown`]: Self::shutdown
pub trait IrqChip: Send + Sync {
    /// Gets a short name of the controller for log messages.
    fn name(&self) -> &'static str;

    /// Prepares and unmasks the line when its first action is attached.
    ///
    /// Returns whether a request was already pending on the line.
    fn startup(&self, line: IrqLine) -> bool {
        self.enable(line);
        false
    }

    /// Masks the line after its last action is removed.
    fn shutdown(&self, line: IrqLine) {
        self.disable(line);
    }

    /// Unmasks the line.
    fn enable(&self, line: IrqLine);

    /// Masks the line.
    fn disable(&self, line: IrqLine);

    /// Clears the latched request of exactly this line.
    fn ack(&self, line: IrqLine) -> AckStatus;

    /// Masks the line and clears its latched request in one step.
    fn mask_and_ack(&self, line: IrqLine) -> AckStatus {
        self.disable(line);
        self.ack(line)
    }

    /// Finishes the handling of a request.
    ///
    /// The line is unmasked again unless it is disabled or still being
    /// handled on another CPU.
    fn end(&self, line: IrqLine, status: IrqStatus) {
        if !status.intersects(IrqStatus::DISABLED | IrqStatus::INPROGRESS) {
            self.enable(line);
        }
    }

    /// Programs the edges the line latches on.
    ///
    /// Must be called while the line is masked.
    fn set_trigger(&self, line: IrqLine, sense: EdgeSense) -> Result<()> {
        let _ = (line, sense);
        Err(Error::InvalidArgs)
    }

    /// Returns whether this is a real controller rather than the stub that
    /// guards unbound lines.
    fn is_bound(&self) -> bool {
        true
    }
}

/// The controller of lines that have no hardware bound to them.
///
/// Masking an unbound line is harmless, but a request arriving on one means
/// the platform tables are wrong.
pub struct NoIrqChip;

impl IrqChip for NoIrqChip {
    fn name(&self) -> &'static str {
        "none"
    }

    fn startup(&self, _line: IrqLine) -> bool {
        false
    }

    fn enable(&self, _line: IrqLine) {}

    fn disable(&self, _line: IrqLine) {}

    fn ack(&self, line: IrqLine) -> AckStatus {
        panic!("unexpected IRQ trap on unbound line {}", line);
    }

    fn mask_and_ack(&self, line: IrqLine) -> AckStatus {
        self.ack(line)
    }

    fn end(&self, _line: IrqLine, _status: IrqStatus) {}

    fn is_bound(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[should_panic(expected = "unbound line 9")]
    fn stub_panics_on_ack() {
        let _ = NoIrqChip.mask_and_ack(9);
    }

    #[test]
    fn stub_tolerates_masking() {
        NoIrqChip.enable(3);
        NoIrqChip.disable(3);
        assert!(!NoIrqChip.startup(3));
        assert!(!NoIrqChip.is_bound());
        assert_eq!(NoIrqChip.set_trigger(3, EdgeSense::BOTH), Err(Error::InvalidArgs));
    }
}
