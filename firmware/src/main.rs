// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

mod board;
mod hw;
mod ports;

use crate::{
    board::Board,
    hw::{interrupt, periph},
    ports::ports_init,
};
use acdim::{
    System,
    mutex::{CriticalSection, IrqCtx, MainCtx, reset_system},
};

static SYSTEM: System = System::new();
static BOARD: Board = Board::new();

// SMCR: Idle sleep mode, sleep enable.
const SMCR_IDLE: u8 = 0x01;

fn wdt_init() {
    // SAFETY: The asm code only accesses the WDT registers
    //         which are not accessed from anywhere else in the program.
    unsafe {
        // Enable WDT with timeout 2 s
        core::arch::asm!(
            "wdr",
            "ldi {tmp}, 0x18", // WDCE=1, WDE=1
            "sts {WDTCSR}, {tmp}",
            "ldi {tmp}, 0x0F", // WDCE=0, WDE=1, WDP2=1, WDP1=1, WDP0=1
            "sts {WDTCSR}, {tmp}",
            tmp = out(reg_upper) _,
            WDTCSR = const 0x60,
            options(nostack, preserves_flags)
        );
    }
}

fn wdt_poke() {
    avr_device::asm::wdr();
}

/// Sleep until the next interrupt, unless a wake-up is pending.
///
/// Returns `true`, if the main loop work shall run.
fn wait_for_wake() -> bool {
    interrupt::disable();
    // SAFETY: Interrupts are disabled.
    let cs = unsafe { CriticalSection::new() };
    if SYSTEM.take_wake(cs) {
        // SAFETY: Enabling interrupts in the main loop outside of critical sections.
        unsafe { interrupt::enable() };
        true
    } else {
        // SAFETY: SEI takes effect after the next instruction.
        //         No interrupt can set a wake-up between the check and the sleep.
        unsafe {
            core::arch::asm!("sei", "sleep", options(nomem, nostack));
        }
        false
    }
}

pub fn irq_handler_zero_cross(c: &IrqCtx<'_>) {
    #[cfg(feature = "debug")]
    BOARD.debug_toggle();
    SYSTEM.irq_zero_cross(c, &BOARD);
}

pub fn irq_handler_triac(c: &IrqCtx<'_>) {
    SYSTEM.irq_triac(c, &BOARD);
}

pub fn irq_handler_pcint2(c: &IrqCtx<'_>) {
    if BOARD.input_departed(c.cs()) {
        SYSTEM.irq_input_edge(c, &BOARD);
    }
}

#[avr_device::entry]
fn main() -> ! {
    wdt_init();

    // SAFETY: Interrupts are still disabled.
    let dp = unsafe { periph() };
    ports_init(&dp);
    // SAFETY: Sleep mode configuration.
    unsafe {
        dp.CPU.smcr().write(|w| w.bits(SMCR_IDLE));
    }
    BOARD.timer_init();

    // SAFETY:
    // This is the context handle for the main() function.
    // Holding a reference to this object proves that the holder
    // is running in main() context.
    let m = unsafe { MainCtx::new() };

    SYSTEM.init(&m, &BOARD);

    // SAFETY: This must be after construction of MainCtx
    //         and after initialization of the system.
    unsafe { interrupt::enable() };

    loop {
        // Without mains there are no wake-ups and the watchdog resets the system.
        if wait_for_wake() {
            SYSTEM.run(&m);
            wdt_poke();
        }
    }
}

#[inline(always)]
#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    reset_system();
}

// vim: ts=4 sw=4 expandtab
