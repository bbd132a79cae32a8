// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::hw::Peripherals;

/// PB0/ICP1: Mains opto-coupler. Low around the positive peak.
pub const PB_ZC: u8 = 0;
/// PB1/OC1A: TRIAC gate driver.
pub const PB_GATE: u8 = 1;
/// PB4: Debug pin.
pub const PB_DEBUG: u8 = 4;
/// PB5: Status LED.
pub const PB_STATUS: u8 = 5;

/// PC0/ADC0: Potentiometer.
pub const PC_POT: u8 = 0;

/// PD2/PCINT18: Off switch.
pub const PD_OFF: u8 = 2;
/// PD3/PCINT19: On switch.
pub const PD_ON: u8 = 3;
/// PD4/PCINT20: Trigger.
pub const PD_TRIGGER: u8 = 4;

/// First bit of the contiguous input bit group in PORTD.
pub const PD_INPUTS_SHIFT: u8 = PD_OFF;
/// All input bits in PORTD.
pub const PD_INPUTS_MASK: u8 = (1 << PD_OFF) | (1 << PD_ON) | (1 << PD_TRIGGER);

const _: () = assert!(PD_ON == PD_OFF + 1 && PD_TRIGGER == PD_OFF + 2);

const fn bit(b: u8) -> u8 {
    1 << b
}

pub fn ports_init(dp: &Peripherals) {
    // SAFETY: Plain port configuration. Every bit combination is valid.
    unsafe {
        dp.PORTB.portb().write(|w| w.bits(bit(PB_ZC)));
        dp.PORTB
            .ddrb()
            .write(|w| w.bits(bit(PB_GATE) | bit(PB_DEBUG) | bit(PB_STATUS)));

        dp.PORTC.portc().write(|w| w.bits(0));
        dp.PORTC.ddrc().write(|w| w.bits(0));

        // Inputs with pull-ups.
        dp.PORTD.portd().write(|w| w.bits(PD_INPUTS_MASK));
        dp.PORTD.ddrd().write(|w| w.bits(0));

        // No digital input buffer on the pot pin.
        dp.ADC.didr0().write(|w| w.bits(bit(PC_POT)));
    }
}

// vim: ts=4 sw=4 expandtab
