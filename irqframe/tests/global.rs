// SPDX-License-Identifier: MPL-2.0

mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use common::FakeRegs;
use irqframe::{
    IrqConfig,
    irq::{self, DevId, Dispatch, IrqFlags, IrqReturn},
    platform::integrator,
};

fn discard(_line: &str) {}

#[test]
fn process_wide_table() {
    let config = IrqConfig::from_cmdline("quiet irq.max_redispatch=2 irq.log_level=off");
    let table = irqframe::init(config, discard);
    assert_eq!(table.config().max_redispatch, 2);
    assert!(core::ptr::eq(table, irq::table()));

    integrator::init(table, FakeRegs::new(&[])).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = hits.clone();
        irq::request_irq(
            6,
            move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                IrqReturn::Handled
            },
            IrqFlags::empty(),
            "rtc",
            DevId(6),
        )
        .unwrap();
    }

    irq::disable_irq(6).unwrap();
    assert_eq!(irq::handle_irq(6), Dispatch::Deferred);
    irq::enable_irq(6).unwrap();
    assert_eq!(irq::handle_irq(6), Dispatch::Handled);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    irq::disable_irq_nosync(6).unwrap();
    irq::enable_irq(6).unwrap();
    irq::free_irq(6, DevId(6)).unwrap();
    assert_eq!(irq::free_irq(6, DevId(6)), Err(irqframe::Error::NotFound));
}
