// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    analog::Pot,
    debounce::{DEBOUNCE_LEN, Debounce},
    dimtab::DIMCURVE,
    fade::Fade,
    hal::Hal,
    inputs::InputSet,
    mains::{Mains, Measurement},
    mutex::{CriticalSection, IrqCtx, IrqCtxCell, MainCtx, MainCtxCell, SharedCell},
    opstate::OpState,
    timer::RelTimestamp,
    triac::Triac,
};

/// Number of mains periods between unconditional wake-ups of the main loop.
pub const JIFFIES: u8 = 60;

/// Number of half-waves the TRIAC may be triggered on the projected
/// zero crossing without a new mains measurement.
pub const PROJECTION_LIMIT: u8 = 6;

/// State shared between the main loop and the interrupts.
struct Shared {
    power: SharedCell<u16>,
    updated: SharedCell<bool>,
    triac_delay: SharedCell<RelTimestamp>,
    half_period: SharedCell<RelTimestamp>,
    locked: SharedCell<bool>,
    wake: SharedCell<bool>,
}

impl Shared {
    const fn new() -> Self {
        Self {
            power: SharedCell::new(0),
            updated: SharedCell::new(false),
            triac_delay: SharedCell::new(RelTimestamp::new()),
            half_period: SharedCell::new(RelTimestamp::new()),
            locked: SharedCell::new(false),
            wake: SharedCell::new(false),
        }
    }

    /// Write a new power value.
    ///
    /// Returns `true`, if the value changed.
    fn set_power(&self, cs: CriticalSection<'_>, power: u16) -> bool {
        self.updated.set(cs, true);
        self.power.replace(cs, power) != power
    }
}

/// Snapshot of the shared state taken by the main loop.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Snapshot {
    pub power: u16,
    pub updated: bool,
    pub half_period: RelTimestamp,
    pub locked: bool,
}

pub struct System {
    shared: Shared,
    state: IrqCtxCell<OpState>,
    debounce: Debounce<InputSet, DEBOUNCE_LEN>,
    committed: IrqCtxCell<InputSet>,
    mains: Mains,
    triac: Triac,
    fade: Fade,
    pot: Pot,
    jiffies: IrqCtxCell<u8>,
    projected: IrqCtxCell<u8>,
    last_half: MainCtxCell<RelTimestamp>,
}

impl System {
    pub const fn new() -> Self {
        Self {
            shared: Shared::new(),
            state: IrqCtxCell::new(OpState::Initial),
            debounce: Debounce::new(InputSet::NONE),
            committed: IrqCtxCell::new(InputSet::NONE),
            mains: Mains::new(),
            triac: Triac::new(),
            fade: Fade::new(),
            pot: Pot::new(),
            jiffies: IrqCtxCell::new(JIFFIES),
            projected: IrqCtxCell::new(0),
            last_half: MainCtxCell::new(RelTimestamp::new()),
        }
    }

    /// Bring the hardware into the initial state.
    ///
    /// Must be called with interrupts disabled.
    pub fn init(&self, _m: &MainCtx<'_>, hal: &impl Hal) {
        hal.triac_disable();
        hal.set_status(false);
        hal.inputs_disarm();
        hal.adc_enable(false);
        self.mains.init(hal);
    }

    pub fn state(&self, c: &IrqCtx<'_>) -> OpState {
        self.state.get(c)
    }

    /// Mains capture and capture timeout interrupt.
    pub fn irq_zero_cross(&self, c: &IrqCtx<'_>, hal: &impl Hal) {
        let Some(meas) = self.mains.irq(c, hal) else {
            return;
        };
        let cs = c.cs();

        self.projected.set(c, 0);
        self.shared.half_period.set(cs, meas.half);
        let mut wake = self.shared.locked.replace(cs, meas.locked) != meas.locked;
        self.update_zero_cross(c, hal, &meas);

        if let Some(adjusted) = self.pot.run(c, hal) {
            if self.fade.is_active(c) {
                self.fade.set_target(c, adjusted);
            } else {
                wake |= self.shared.set_power(cs, adjusted);
            }
        }

        wake |= self.run_inputs(c, hal);

        if self.fade.is_active(c) && !self.pot.is_starting(c) {
            let power = self.fade.run(c, self.shared.power.get(cs));
            wake |= self.shared.set_power(cs, power);
            if !self.fade.is_active(c) && power == 0 {
                // Faded out.
                self.shared.triac_delay.set(cs, RelTimestamp::new());
                if self.triac.is_armed(c) {
                    self.triac.disarm(c, hal);
                }
            }
        }

        let jiffies = self.jiffies.get(c) - 1;
        if jiffies == 0 {
            self.jiffies.set(c, JIFFIES);
            wake = true;
        } else {
            self.jiffies.set(c, jiffies);
        }

        if wake {
            self.shared.wake.set(cs, true);
        }
    }

    fn update_zero_cross(&self, c: &IrqCtx<'_>, hal: &impl Hal, meas: &Measurement) {
        let delay = self.shared.triac_delay.get(c.cs());
        if !meas.locked || delay.is_zero() {
            if self.triac.is_armed(c) {
                self.triac.disarm(c, hal);
            }
            return;
        }
        let in_sync = self.triac.is_armed(c)
            && self
                .triac
                .in_sync(c, meas.crossing, meas.half, meas.quarter);
        if !in_sync {
            self.triac.arm(c, hal, meas.crossing + meas.half, delay);
        }
    }

    /// Debounce the inputs and run the state machine.
    ///
    /// Returns `true`, if the state changed.
    fn run_inputs(&self, c: &IrqCtx<'_>, hal: &impl Hal) -> bool {
        let state = self.state.get(c);
        let committed = self.committed.get(c);
        let mask = state.input_mask(committed);

        let Some(levels) = self.debounce.run(c, hal.inputs_read() & mask) else {
            return false;
        };

        let changed = state == OpState::Initial || !((levels ^ committed) & mask).is_empty();
        let next = if changed { state.next(levels) } else { state };

        // Inputs that start being watched are taken over at their
        // current level. Only a later edge counts as a change.
        let added = next.input_mask(levels).without(mask);
        let levels = levels | (hal.inputs_read() & added);

        let (enabled, falling) = next.edge_config(levels);
        hal.inputs_arm(enabled, falling);
        let now = hal.inputs_read();
        let stable = self.debounce.verify(c, now & mask);
        if !stable || (now & added) != (levels & added) {
            // Changed while arming. Try again.
            hal.inputs_disarm();
            self.debounce.start(c);
            return false;
        }
        self.committed.set(c, levels);

        if next == state {
            return false;
        }
        self.state.set(c, next);
        self.pot.enable(c, hal, next.pot_enabled());
        if let Some((target, step)) = next.desc().fade {
            self.fade.load(c, target, step);
        }
        true
    }

    /// TRIAC compare match interrupt.
    pub fn irq_triac(&self, c: &IrqCtx<'_>, hal: &impl Hal) {
        let cs = c.cs();
        let delay = self.shared.triac_delay.get(cs);
        if !self.triac.irq_compare(c, hal, delay, self.mains.half(c)) {
            return;
        }

        let projected = self.projected.get(c) + 1;
        if projected <= PROJECTION_LIMIT {
            self.projected.set(c, projected);
            return;
        }
        // The mains pulses are gone.
        self.projected.set(c, 0);
        self.triac.disarm(c, hal);
        self.mains.unlock(c);
        self.shared.locked.set(cs, false);
        self.shared.wake.set(cs, true);
    }

    /// An enabled input left its committed level.
    pub fn irq_input_edge(&self, c: &IrqCtx<'_>, hal: &impl Hal) {
        hal.inputs_disarm();
        self.debounce.start(c);
    }

    /// Consume a pending wake-up request.
    pub fn take_wake(&self, cs: CriticalSection<'_>) -> bool {
        self.shared.wake.replace(cs, false)
    }

    fn snapshot(&self, cs: CriticalSection<'_>) -> Snapshot {
        Snapshot {
            power: self.shared.power.get(cs),
            updated: self.shared.updated.replace(cs, false),
            half_period: self.shared.half_period.get(cs),
            locked: self.shared.locked.get(cs),
        }
    }

    pub fn power(&self, cs: CriticalSection<'_>) -> u16 {
        self.shared.power.get(cs)
    }

    /// Current TRIAC delay as published by [System::run].
    pub fn triac_delay(&self, cs: CriticalSection<'_>) -> RelTimestamp {
        self.shared.triac_delay.get(cs)
    }

    /// Main loop work.
    ///
    /// Translates the power into the TRIAC delay.
    pub fn run(&self, m: &MainCtx<'_>) {
        let snap = critical_section::with(|cs| self.snapshot(cs));

        let half = if snap.locked {
            snap.half_period
        } else {
            RelTimestamp::new()
        };
        if !snap.updated && half == self.last_half.get(m) {
            return;
        }
        self.last_half.set(m, half);

        let delay = DIMCURVE.triac_delay(snap.power, half);

        critical_section::with(|cs| self.shared.triac_delay.set(cs, delay));
    }
}


// vim: ts=4 sw=4 expandtab
