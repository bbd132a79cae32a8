// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::{
    hw::periph,
    ports::{PB_STATUS, PD_INPUTS_MASK, PD_INPUTS_SHIFT, PD_OFF, PD_ON, PD_TRIGGER},
};
use acdim::{
    Edge, Hal, InputSet,
    mutex::{CriticalSection, Mutex},
    timer::Timestamp,
};
use core::cell::Cell;

// TCCR1A
const COM1A_CLEAR: u8 = 0x80;
const COM1A_SET: u8 = 0xC0;
// TCCR1B
const ICNC1: u8 = 1 << 7;
const ICES1: u8 = 1 << 6;
const CS1_DIV8: u8 = 0x02;
// TCCR1C
const FOC1A: u8 = 1 << 7;
// TIMSK1 and TIFR1
const TC1_CAPT: u8 = 1 << 5;
const TC1_COMPB: u8 = 1 << 2;
const TC1_COMPA: u8 = 1 << 1;

// ADMUX: AVcc reference, channel ADC0.
const ADMUX_POT: u8 = 0x40;
// ADCSRA
const ADEN: u8 = 1 << 7;
const ADSC: u8 = 1 << 6;
const ADIF: u8 = 1 << 4;
const ADPS_DIV64: u8 = 0x06;

const PCIE2: u8 = 1 << 2;
const PCIF2: u8 = 1 << 2;

/// Input edge configuration: (enabled, falling).
static INPUT_EDGES: Mutex<Cell<(InputSet, InputSet)>> =
    Mutex::new(Cell::new((InputSet::NONE, InputSet::NONE)));

/// Map the PORTD input pins to an [InputSet].
const fn pind_to_inputs(pind: u8) -> InputSet {
    InputSet((pind & PD_INPUTS_MASK) >> PD_INPUTS_SHIFT)
}

/// Map an [InputSet] to PCINT16..23 mask bits.
const fn inputs_to_pcmsk2(inputs: InputSet) -> u8 {
    let mut mask = 0;
    if inputs.contains(InputSet::OFF_SWITCH) {
        mask |= 1 << PD_OFF;
    }
    if inputs.contains(InputSet::ON_SWITCH) {
        mask |= 1 << PD_ON;
    }
    if inputs.contains(InputSet::TRIGGER) {
        mask |= 1 << PD_TRIGGER;
    }
    mask
}

/// ATmega328P at 8 MHz with Timer1 at 1 us per tick.
pub struct Board;

impl Board {
    pub const fn new() -> Self {
        Self
    }

    #[rustfmt::skip]
    pub fn timer_init(&self) {
        // SAFETY: Called with interrupts disabled.
        let dp = unsafe { periph() };
        // SAFETY: Timer 1 normal mode, prescaler 8 -> 1 us per tick.
        unsafe {
            dp.TC1.timsk1().write(|w| w.bits(0));
            dp.TC1.tccr1a().write(|w| w.bits(0));
            dp.TC1.tccr1b().write(|w| w.bits(ICNC1 | CS1_DIV8));
            dp.TC1.tifr1().write(|w| w.bits(TC1_CAPT | TC1_COMPB | TC1_COMPA));
        }
    }

    /// Check whether an enabled input left its committed level.
    ///
    /// Pin change interrupts fire on both edges.
    pub fn input_departed(&self, cs: CriticalSection<'_>) -> bool {
        let (enabled, falling) = INPUT_EDGES.borrow(cs).get();
        !((self.inputs_read() ^ falling) & enabled).is_empty()
    }

    #[cfg(feature = "debug")]
    pub fn debug_toggle(&self) {
        // SAFETY: Called from interrupt context.
        let dp = unsafe { periph() };
        // SAFETY: Writing PINB toggles the port bit.
        unsafe {
            dp.PORTB
                .pinb()
                .write(|w| w.bits(1 << crate::ports::PB_DEBUG));
        }
    }

    fn timsk1_modify(&self, set: u8, clear: u8) {
        // SAFETY: Called from interrupt context or with interrupts disabled.
        let dp = unsafe { periph() };
        // SAFETY: All interrupt enable combinations are valid.
        unsafe {
            dp.TC1
                .timsk1()
                .modify(|r, w| w.bits((r.bits() & !clear) | set));
        }
    }

    fn gate_force_off(&self) {
        // SAFETY: Called from interrupt context or with interrupts disabled.
        let dp = unsafe { periph() };
        // SAFETY: Force a compare match with clear-on-match output mode.
        unsafe {
            dp.TC1.tccr1a().write(|w| w.bits(COM1A_CLEAR));
            dp.TC1.tccr1c().write(|w| w.bits(FOC1A));
        }
    }
}

impl Hal for Board {
    fn zc_captured(&self) -> Timestamp {
        // SAFETY: Called from interrupt context.
        let dp = unsafe { periph() };
        Timestamp(dp.TC1.icr1().read().bits())
    }

    fn zc_arm_capture(&self, edge: Edge) {
        // SAFETY: Called from interrupt context or with interrupts disabled.
        let dp = unsafe { periph() };
        let ices = match edge {
            Edge::Falling => 0,
            Edge::Rising => ICES1,
        };
        // SAFETY: Changing the edge may raise TC1_CAPT. Clear it afterwards.
        unsafe {
            dp.TC1.tccr1b().write(|w| w.bits(ICNC1 | ices | CS1_DIV8));
            dp.TC1.tifr1().write(|w| w.bits(TC1_CAPT));
        }
        self.timsk1_modify(TC1_CAPT, TC1_COMPB);
    }

    fn zc_arm_timeout(&self, at: Timestamp) {
        // SAFETY: Called from interrupt context.
        let dp = unsafe { periph() };
        // SAFETY: Any compare value is valid.
        unsafe {
            dp.TC1.ocr1b().write(|w| w.bits(at.0));
            dp.TC1.tifr1().write(|w| w.bits(TC1_COMPB));
        }
        self.timsk1_modify(TC1_COMPB, TC1_CAPT);
    }

    fn triac_set_compare(&self, at: Timestamp) {
        // SAFETY: Called from interrupt context.
        let dp = unsafe { periph() };
        // SAFETY: Any compare value is valid.
        unsafe {
            dp.TC1.ocr1a().write(|w| w.bits(at.0));
        }
    }

    fn triac_enable(&self) {
        // SAFETY: Called from interrupt context.
        let dp = unsafe { periph() };
        // SAFETY: Set OC1A on compare match.
        unsafe {
            dp.TC1.tifr1().write(|w| w.bits(TC1_COMPA));
            dp.TC1.tccr1a().write(|w| w.bits(COM1A_SET));
        }
        self.timsk1_modify(TC1_COMPA, 0);
    }

    fn triac_disable(&self) {
        self.timsk1_modify(0, TC1_COMPA);
        self.gate_force_off();
        // SAFETY: Called from interrupt context or with interrupts disabled.
        let dp = unsafe { periph() };
        // SAFETY: Disconnect OC1A. The port bit is low.
        unsafe {
            dp.TC1.tccr1a().write(|w| w.bits(0));
        }
    }

    fn triac_gate_retrigger(&self) {
        self.gate_force_off();
        // SAFETY: Called from interrupt context.
        let dp = unsafe { periph() };
        // SAFETY: Set OC1A on the next compare match.
        unsafe {
            dp.TC1.tccr1a().write(|w| w.bits(COM1A_SET));
        }
    }

    fn inputs_read(&self) -> InputSet {
        // SAFETY: Read only access.
        let dp = unsafe { periph() };
        pind_to_inputs(dp.PORTD.pind().read().bits())
    }

    fn inputs_arm(&self, enabled: InputSet, falling: InputSet) {
        // SAFETY: Called from interrupt context.
        let dp = unsafe { periph() };
        // SAFETY: The cs is only used for INPUT_EDGES.
        let cs = unsafe { CriticalSection::new() };
        INPUT_EDGES.borrow(cs).set((enabled, falling));
        // SAFETY: Any PCINT mask is valid.
        unsafe {
            dp.EXINT.pcmsk2().write(|w| w.bits(inputs_to_pcmsk2(enabled)));
            dp.EXINT.pcifr().write(|w| w.bits(PCIF2));
            dp.EXINT.pcicr().write(|w| w.bits(PCIE2));
        }
    }

    fn inputs_disarm(&self) {
        // SAFETY: Called from interrupt context or with interrupts disabled.
        let dp = unsafe { periph() };
        // SAFETY: Disabling the pin change interrupts is always valid.
        unsafe {
            dp.EXINT.pcicr().write(|w| w.bits(0));
            dp.EXINT.pcmsk2().write(|w| w.bits(0));
        }
    }

    fn adc_enable(&self, enable: bool) {
        // SAFETY: Called from interrupt context or with interrupts disabled.
        let dp = unsafe { periph() };
        // SAFETY: ADC0 single conversion mode, 125 kHz ADC clock.
        unsafe {
            dp.ADC.admux().write(|w| w.bits(ADMUX_POT));
            if enable {
                dp.ADC.adcsra().write(|w| w.bits(ADEN | ADIF | ADPS_DIV64));
            } else {
                dp.ADC.adcsra().write(|w| w.bits(ADIF));
            }
        }
    }

    fn adc_start(&self) {
        // SAFETY: Called from interrupt context.
        let dp = unsafe { periph() };
        // SAFETY: Start the conversion and clear the finished flag.
        unsafe {
            dp.ADC
                .adcsra()
                .write(|w| w.bits(ADEN | ADSC | ADIF | ADPS_DIV64));
        }
    }

    fn adc_result(&self) -> Option<u16> {
        // SAFETY: Called from interrupt context.
        let dp = unsafe { periph() };
        let adcsra = dp.ADC.adcsra().read().bits();
        if adcsra & ADIF == 0 || adcsra & ADSC != 0 {
            return None;
        }
        // SAFETY: Clear the finished flag.
        unsafe {
            dp.ADC.adcsra().write(|w| w.bits(ADEN | ADIF | ADPS_DIV64));
        }
        Some(dp.ADC.adc().read().bits())
    }

    fn set_status(&self, on: bool) {
        // SAFETY: Called from interrupt context or with interrupts disabled.
        let dp = unsafe { periph() };
        // SAFETY: Only the status bit is changed.
        unsafe {
            dp.PORTB.portb().modify(|r, w| {
                let bits = r.bits() & !(1 << PB_STATUS);
                w.bits(bits | ((on as u8) << PB_STATUS))
            });
        }
    }
}

// vim: ts=4 sw=4 expandtab
