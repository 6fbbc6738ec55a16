// SPDX-License-Identifier: MPL-2.0

//! Interrupt bring-up of the supported boards.
//!
//! Each board module creates the board's controllers, binds them to their
//! lines in a descriptor table and wires up the cascades. Drivers can request
//! lines once the board's `init` has returned.

pub mod ev64120;
pub mod graphicsclient;
pub mod integrator;
pub mod mpc8xx;
pub mod pc;
