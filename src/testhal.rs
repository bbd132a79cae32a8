// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording hardware mock and a mains simulator for the unit tests.

use crate::{
    hal::{Edge, Hal},
    inputs::InputSet,
    mutex::test_ctx,
    opstate::OpState,
    system::System,
    timer::{RelTimestamp, Timestamp},
};
use std::{
    cell::{Cell, RefCell},
    vec::Vec,
};

pub struct MockHal {
    /// Absolute simulation time in microseconds.
    pub now: Cell<u64>,
    pub captured: Cell<Timestamp>,
    pub capture_edge: Cell<Option<Edge>>,
    pub timeout: Cell<Option<Timestamp>>,
    pub compare: Cell<Timestamp>,
    pub compare_fires: Cell<u32>,
    pub triac_enabled: Cell<bool>,
    pub gate_retriggers: Cell<u32>,
    /// Times of the gate pulse ends.
    pub gate_log: RefCell<Vec<u64>>,
    pub levels: Cell<InputSet>,
    /// Enabled inputs and falling edge inputs.
    pub edges: Cell<Option<(InputSet, InputSet)>>,
    pub adc_enabled: Cell<bool>,
    pub adc_starts: Cell<u32>,
    pub adc_value: Cell<Option<u16>>,
    pub status: Cell<bool>,
}

impl MockHal {
    pub fn new() -> Self {
        Self {
            now: Cell::new(0),
            captured: Cell::new(Timestamp::new()),
            capture_edge: Cell::new(None),
            timeout: Cell::new(None),
            compare: Cell::new(Timestamp::new()),
            compare_fires: Cell::new(0),
            triac_enabled: Cell::new(false),
            gate_retriggers: Cell::new(0),
            gate_log: RefCell::new(Vec::new()),
            levels: Cell::new(InputSet::ALL),
            edges: Cell::new(None),
            adc_enabled: Cell::new(false),
            adc_starts: Cell::new(0),
            adc_value: Cell::new(None),
            status: Cell::new(false),
        }
    }
}

impl Hal for MockHal {
    fn zc_captured(&self) -> Timestamp {
        self.captured.get()
    }

    fn zc_arm_capture(&self, edge: Edge) {
        self.capture_edge.set(Some(edge));
        self.timeout.set(None);
    }

    fn zc_arm_timeout(&self, at: Timestamp) {
        self.capture_edge.set(None);
        self.timeout.set(Some(at));
    }

    fn triac_set_compare(&self, at: Timestamp) {
        self.compare.set(at);
    }

    fn triac_enable(&self) {
        self.triac_enabled.set(true);
    }

    fn triac_disable(&self) {
        self.triac_enabled.set(false);
    }

    fn triac_gate_retrigger(&self) {
        self.gate_retriggers.set(self.gate_retriggers.get() + 1);
        self.gate_log.borrow_mut().push(self.now.get());
    }

    fn inputs_read(&self) -> InputSet {
        self.levels.get()
    }

    fn inputs_arm(&self, enabled: InputSet, falling: InputSet) {
        self.edges.set(Some((enabled, falling)));
    }

    fn inputs_disarm(&self) {
        self.edges.set(None);
    }

    fn adc_enable(&self, enable: bool) {
        self.adc_enabled.set(enable);
    }

    fn adc_start(&self) {
        self.adc_starts.set(self.adc_starts.get() + 1);
    }

    fn adc_result(&self) -> Option<u16> {
        self.adc_value.get()
    }

    fn set_status(&self, on: bool) {
        self.status.set(on);
    }
}

/// Simulated mains period (60 Hz).
pub const PERIOD: u64 = 16666;
/// Opto-coupler pulse length.
pub const PULSE: u64 = 6000;
/// Time of the first falling opto-coupler edge.
pub const FALL0: u64 = 1000;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Event {
    Capture,
    Timeout,
    Compare,
}

/// Mains and timer simulator driving a [System] on a [MockHal].
pub struct Sim {
    pub hal: MockHal,
    pub sys: System,
    pub wakes: Cell<u32>,
    /// Number of entries into [OpState::Triggered].
    pub triggered: Cell<u32>,
    /// Mains phase shift in microseconds.
    pub phase: Cell<u64>,
    /// The opto-coupler delivers pulses.
    pub mains_on: Cell<bool>,
    last_state: Cell<OpState>,
}

impl Sim {
    pub fn new(levels: InputSet) -> Self {
        let sim = Self {
            hal: MockHal::new(),
            sys: System::new(),
            wakes: Cell::new(0),
            triggered: Cell::new(0),
            phase: Cell::new(0),
            mains_on: Cell::new(true),
            last_state: Cell::new(OpState::Initial),
        };
        sim.hal.levels.set(levels);
        sim.sys.init(&test_ctx::main(), &sim.hal);
        sim
    }

    fn now(&self) -> u64 {
        self.hal.now.get()
    }

    /// Absolute time at which the 16 bit timer reaches `stamp` next.
    fn abs_time(&self, stamp: Timestamp) -> u64 {
        let now = self.now();
        let ahead = stamp.0.wrapping_sub(now as u16);
        if ahead == 0 {
            now + 0x10000
        } else {
            now + ahead as u64
        }
    }

    /// Next opto-coupler edge strictly after now.
    fn next_edge(&self, first: u64) -> u64 {
        let first = first + self.phase.get();
        let now = self.now();
        if now < first {
            first
        } else {
            first + ((now - first) / PERIOD + 1) * PERIOD
        }
    }

    fn next_event(&self) -> (u64, Event) {
        let mut next = (u64::MAX, Event::Capture);
        let mut consider = |t: u64, ev: Event| {
            if t < next.0 {
                next = (t, ev);
            }
        };
        match self.hal.capture_edge.get() {
            _ if !self.mains_on.get() => (),
            Some(Edge::Falling) => consider(self.next_edge(FALL0), Event::Capture),
            Some(Edge::Rising) => consider(self.next_edge(FALL0 + PULSE), Event::Capture),
            None => (),
        }
        if let Some(timeout) = self.hal.timeout.get() {
            consider(self.abs_time(timeout), Event::Timeout);
        }
        if self.hal.triac_enabled.get() {
            consider(self.abs_time(self.hal.compare.get()), Event::Compare);
        }
        next
    }

    fn after_event(&self) {
        let state = self.state();
        if state != self.last_state.get() {
            if state == OpState::Triggered {
                self.triggered.set(self.triggered.get() + 1);
            }
            self.last_state.set(state);
        }
        if critical_section::with(|cs| self.sys.take_wake(cs)) {
            self.wakes.set(self.wakes.get() + 1);
            self.sys.run(&test_ctx::main());
        }
    }

    /// Run the simulation for `us` microseconds.
    pub fn run_for(&self, us: u64) {
        let end = self.now() + us;
        loop {
            let (t, ev) = self.next_event();
            if t > end {
                self.hal.now.set(end);
                break;
            }
            self.hal.now.set(t);
            let c = test_ctx::irq();
            match ev {
                Event::Capture => {
                    self.hal.captured.set(Timestamp(t as u16));
                    self.sys.irq_zero_cross(&c, &self.hal);
                }
                Event::Timeout => {
                    self.hal.timeout.set(None);
                    self.sys.irq_zero_cross(&c, &self.hal);
                }
                Event::Compare => {
                    self.hal.compare_fires.set(self.hal.compare_fires.get() + 1);
                    self.sys.irq_triac(&c, &self.hal);
                }
            }
            drop(c);
            self.after_event();
        }
    }

    /// Change the input pin levels.
    pub fn set_inputs(&self, levels: InputSet) {
        self.hal.levels.set(levels);
        if let Some((enabled, falling)) = self.hal.edges.get() {
            if !((levels ^ falling) & enabled).is_empty() {
                let c = test_ctx::irq();
                self.sys.irq_input_edge(&c, &self.hal);
            }
        }
        self.after_event();
    }

    pub fn state(&self) -> OpState {
        self.sys.state(&test_ctx::irq())
    }

    pub fn power(&self) -> u16 {
        critical_section::with(|cs| self.sys.power(cs))
    }

    pub fn triac_delay(&self) -> RelTimestamp {
        critical_section::with(|cs| self.sys.triac_delay(cs))
    }

    /// Time of `t` after the last real mains zero crossing.
    pub fn time_since_crossing(&self, t: u64) -> u64 {
        let first = FALL0 + self.phase.get() + PULSE / 2 + PERIOD / 4;
        (t - first) % (PERIOD / 2)
    }
}

// vim: ts=4 sw=4 expandtab
