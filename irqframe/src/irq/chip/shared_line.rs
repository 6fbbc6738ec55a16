// SPDX-License-Identifier: MPL-2.0

//! The PCI interrupt routing of the Galileo EV64120 board.
//!
//! Up to [`NR_AGENTS`] PCI agents share two physical CPU lines. A cause
//! register latches which agent asserted its request, an agent mask selects
//! which agents may raise anything, and a CPU mask gates each physical line.
//!
//! Masking one agent also closes its whole physical line in the CPU mask, so
//! disabling a single logical line silences every agent routed with it until
//! some agent on that line is enabled again.

use bit_field::BitField;
use log::info;
use spin::Mutex;

use super::{AckStatus, IrqChip};
use crate::{
    io::{ReadWriteAccess, Reg, RegisterIo, WriteOnlyAccess},
    irq::{Demultiplexer, IrqLine},
    prelude::*,
};

/// The number of logical lines, one per PCI agent.
pub const NR_AGENTS: usize = 21;

/// The number of physical CPU lines the agents are routed to.
const NR_PHYSICAL: usize = 2;

/// Write-1-to-clear.
const CAUSE: Reg<ReadWriteAccess> = Reg::new(0x00);
const AGENT_MASK: Reg<WriteOnlyAccess> = Reg::new(0x04);
const CPU_MASK: Reg<WriteOnlyAccess> = Reg::new(0x08);

struct Masks {
    agents: u32,
    cpu: u32,
}

/// The controller of the logical agent lines.
pub struct SharedLineChip<R> {
    regs: R,
    first_line: IrqLine,
    /// Bit `i` routes agent `i` to physical line 1 instead of 0.
    route: u32,
    masks: Mutex<Masks>,
}

impl<R: RegisterIo> SharedLineChip<R> {
    /// Creates the controller of lines `first_line..first_line + NR_AGENTS`
    /// with every agent and both physical lines masked.
    pub fn new(regs: R, first_line: IrqLine, route: u32) -> Self {
        info!(
            "[EV64120]: {} agents on lines {}.., route {:#x}",
            NR_AGENTS, first_line, route
        );
        AGENT_MASK.write(&regs, 0);
        CPU_MASK.write(&regs, 0);
        Self {
            regs,
            first_line,
            route,
            masks: Mutex::new(Masks { agents: 0, cpu: 0 }),
        }
    }

    /// Gets the line of agent 0.
    pub fn first_line(&self) -> IrqLine {
        self.first_line
    }

    /// Gets the physical line `agent` is routed to.
    pub fn physical_of(&self, agent: usize) -> usize {
        self.route.get_bit(agent) as usize
    }

    fn agent(&self, line: IrqLine) -> usize {
        let agent = line - self.first_line;
        debug_assert!(agent < NR_AGENTS);
        agent
    }

    /// Gets the agents routed to `physical` as a mask.
    fn agents_on(&self, physical: usize) -> u32 {
        let all = (1u32 << NR_AGENTS) - 1;
        if physical == 0 {
            !self.route & all
        } else {
            self.route & all
        }
    }

    fn set_enabled(&self, line: IrqLine, enabled: bool) {
        let agent = self.agent(line);
        let mut masks = self.masks.lock();
        masks.agents.set_bit(agent, enabled);
        masks.cpu.set_bit(self.physical_of(agent), enabled);
        AGENT_MASK.write(&self.regs, masks.agents);
        CPU_MASK.write(&self.regs, masks.cpu);
    }
}

impl<R: RegisterIo> IrqChip for SharedLineChip<R> {
    fn name(&self) -> &'static str {
        "EV64120-PCI"
    }

    fn enable(&self, line: IrqLine) {
        self.set_enabled(line, true);
    }

    fn disable(&self, line: IrqLine) {
        self.set_enabled(line, false);
    }

    fn ack(&self, line: IrqLine) -> AckStatus {
        CAUSE.write(&self.regs, 1 << self.agent(line));
        AckStatus::Acked
    }
}

/// The demultiplexer of one physical line.
///
/// The physical lines are level-triggered and drop once every routed agent
/// is acknowledged, so the parent needs no acknowledgement of its own.
pub struct SharedLineDemux<R> {
    chip: Arc<SharedLineChip<R>>,
    physical: usize,
}

impl<R: RegisterIo> SharedLineDemux<R> {
    /// Creates the demultiplexer of the agents routed to `physical`.
    ///
    /// # Panics
    ///
    /// Panics if `physical` is not 0 or 1.
    pub fn new(chip: Arc<SharedLineChip<R>>, physical: usize) -> Self {
        assert!(physical < NR_PHYSICAL, "no physical line {}", physical);
        Self { chip, physical }
    }
}

impl<R: RegisterIo> Demultiplexer for SharedLineDemux<R> {
    fn name(&self) -> &'static str {
        "ev64120"
    }

    fn child_base(&self) -> IrqLine {
        self.chip.first_line
    }

    fn pending(&self) -> u32 {
        let enabled = self.chip.masks.lock().agents;
        CAUSE.read(&self.chip.regs) & enabled & self.chip.agents_on(self.physical)
    }

    fn ack_parent(&self, _pending: u32) {}
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::fake::FakeRegs;

    const ROUTE: u32 = 0b1100;

    fn chip() -> (Arc<FakeRegs>, Arc<SharedLineChip<Arc<FakeRegs>>>) {
        let regs = FakeRegs::new(&[0x00]);
        let chip = Arc::new(SharedLineChip::new(regs.clone(), 8, ROUTE));
        regs.take_writes();
        (regs, chip)
    }

    #[test]
    fn disabling_an_agent_closes_its_physical_line() {
        let (regs, chip) = chip();
        chip.enable(8 + 2);
        chip.enable(8 + 3);
        assert_eq!(regs.value(0x08), 0b10);

        chip.disable(8 + 2);
        assert_eq!(regs.value(0x04), 0b1000);
        // Agent 3 is still enabled but shares physical line 1.
        assert_eq!(regs.value(0x08), 0);

        chip.enable(8 + 2);
        assert_eq!(regs.value(0x08), 0b10);
    }

    #[test]
    fn demux_filters_by_route_and_mask() {
        let (regs, chip) = chip();
        for agent in [0, 1, 2] {
            chip.enable(8 + agent);
        }
        regs.latch(0x00, 0b1_0111);

        let low = SharedLineDemux::new(chip.clone(), 0);
        let high = SharedLineDemux::new(chip.clone(), 1);
        assert_eq!(low.pending(), 0b0011);
        assert_eq!(high.pending(), 0b0100);

        assert_eq!(chip.ack(8 + 1), AckStatus::Acked);
        assert_eq!(low.pending(), 0b0001);
        assert_eq!(regs.value(0x00), 0b1_0101);
    }
}
