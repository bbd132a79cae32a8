// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    hal::Hal,
    mutex::{IrqCtx, IrqCtxCell},
    timer::{RelTimestamp, Timestamp},
};

/// Delays up to this value fire too close to the zero crossing
/// for a single short gate pulse to latch the TRIAC.
pub const TRIAC_MIN_DELAY: RelTimestamp = RelTimestamp::from_micros(300);

/// Gate pulse extension for short delays.
pub const TRIAC_RETRY: RelTimestamp = RelTimestamp::from_micros(200);

/// TRIAC trigger scheduler.
///
/// The compare unit switches the gate on in hardware.
/// The compare interrupt ends the pulse and schedules the next one.
pub struct Triac {
    armed: IrqCtxCell<bool>,
    delay_off: IrqCtxCell<bool>,
    zerocross: IrqCtxCell<Timestamp>,
    compare: IrqCtxCell<Timestamp>,
}

impl Triac {
    pub const fn new() -> Self {
        Self {
            armed: IrqCtxCell::new(false),
            delay_off: IrqCtxCell::new(false),
            zerocross: IrqCtxCell::new(Timestamp::new()),
            compare: IrqCtxCell::new(Timestamp::new()),
        }
    }

    fn set_compare(&self, c: &IrqCtx<'_>, hal: &impl Hal, at: Timestamp) {
        self.compare.set(c, at);
        hal.triac_set_compare(at);
    }

    pub fn is_armed(&self, c: &IrqCtx<'_>) -> bool {
        self.armed.get(c)
    }

    /// Check whether the projected zero crossing still matches
    /// the `measured` one.
    ///
    /// The projection may already be one half-wave ahead of the measurement.
    pub fn in_sync(
        &self,
        c: &IrqCtx<'_>,
        measured: Timestamp,
        half: RelTimestamp,
        quarter: RelTimestamp,
    ) -> bool {
        let mut deviation = self.zerocross.get(c) - measured;
        if deviation > quarter {
            deviation = deviation - half;
        }
        deviation.abs() <= quarter
    }

    /// Schedule the trigger at `delay` after the zero crossing `zerocross`.
    pub fn arm(&self, c: &IrqCtx<'_>, hal: &impl Hal, zerocross: Timestamp, delay: RelTimestamp) {
        self.zerocross.set(c, zerocross);
        self.set_compare(c, hal, zerocross + delay);
        if !self.armed.get(c) {
            hal.triac_enable();
            hal.set_status(true);
            self.armed.set(c, true);
        }
        if self.delay_off.get(c) {
            hal.triac_gate_retrigger();
            self.delay_off.set(c, false);
        }
    }

    pub fn disarm(&self, c: &IrqCtx<'_>, hal: &impl Hal) {
        hal.triac_disable();
        hal.set_status(false);
        self.armed.set(c, false);
        self.delay_off.set(c, false);
    }

    /// Compare match interrupt.
    ///
    /// Returns `true`, if the trigger moved on to the next half-wave.
    pub fn irq_compare(
        &self,
        c: &IrqCtx<'_>,
        hal: &impl Hal,
        delay: RelTimestamp,
        half: RelTimestamp,
    ) -> bool {
        if !self.armed.get(c) {
            return false;
        }
        if delay.is_zero() {
            self.disarm(c, hal);
            return false;
        }

        if delay > TRIAC_MIN_DELAY || self.delay_off.get(c) {
            let zerocross = self.zerocross.get(c) + half;
            self.zerocross.set(c, zerocross);
            self.set_compare(c, hal, zerocross + delay);
            hal.triac_gate_retrigger();
            self.delay_off.set(c, false);
            true
        } else {
            // Keep the gate on a bit longer.
            self.set_compare(c, hal, self.compare.get(c) + TRIAC_RETRY);
            self.delay_off.set(c, true);
            false
        }
    }
}


// vim: ts=4 sw=4 expandtab
