// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

pub use avr_device::atmega328p::Peripherals;
pub use avr_device::interrupt;

use acdim::mutex::IrqCtx;

macro_rules! define_isr {
    ($name:ident, $handler:path) => {
        #[avr_device::interrupt(atmega328p)]
        fn $name() {
            // SAFETY: We are inside of an interrupt handler.
            // Therefore, it is safe to construct an `IrqCtx`.
            let c = unsafe { IrqCtx::new() };
            $handler(&c);
        }
    };
}

define_isr!(TIMER1_CAPT, crate::irq_handler_zero_cross);
define_isr!(TIMER1_COMPB, crate::irq_handler_zero_cross);
define_isr!(TIMER1_COMPA, crate::irq_handler_triac);
define_isr!(PCINT2, crate::irq_handler_pcint2);

/// Get the peripherals.
///
/// # SAFETY
///
/// The caller must make sure that the returned registers are not
/// accessed concurrently.
/// Interrupt handlers don't nest. Therefore, all accesses from interrupt context
/// are serialized. Accesses from the main loop must mask interrupts.
#[inline(always)]
pub unsafe fn periph() -> Peripherals {
    // SAFETY: See the function contract.
    unsafe { Peripherals::steal() }
}

// vim: ts=4 sw=4 expandtab
