// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{inputs::InputSet, timer::Timestamp};

/// Edge of the mains opto-coupler signal.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Edge {
    Falling,
    Rising,
}

/// Hardware access needed by the control core.
///
/// All methods are called from interrupt context
/// or with interrupts disabled during initialization.
pub trait Hal {
    /// Timer value latched by the last mains capture event.
    fn zc_captured(&self) -> Timestamp;

    /// Arm the mains capture unit for the given `edge`.
    ///
    /// This disables the capture timeout.
    fn zc_arm_capture(&self, edge: Edge);

    /// Disable the capture unit and fire a timeout interrupt at `at`.
    fn zc_arm_timeout(&self, at: Timestamp);

    /// Program the TRIAC compare unit to fire at `at`.
    fn triac_set_compare(&self, at: Timestamp);

    /// Enable the TRIAC compare interrupt and connect the gate to it.
    fn triac_enable(&self);

    /// Disable the TRIAC compare interrupt and turn the gate off.
    fn triac_disable(&self);

    /// End the current gate pulse and re-arm the gate to switch on at
    /// the next compare match.
    fn triac_gate_retrigger(&self);

    /// Read the raw levels of all inputs.
    fn inputs_read(&self) -> InputSet;

    /// Enable edge interrupts for the `enabled` inputs.
    ///
    /// Inputs in `falling` shall trigger on the falling edge,
    /// all others on the rising edge.
    fn inputs_arm(&self, enabled: InputSet, falling: InputSet);

    /// Disable all input edge interrupts.
    fn inputs_disarm(&self);

    /// Power the ADC up or down.
    fn adc_enable(&self, enable: bool);

    /// Start a single conversion of the potentiometer channel.
    fn adc_start(&self);

    /// Fetch the 10 bit result of a finished conversion.
    fn adc_result(&self) -> Option<u16>;

    /// Switch the status indicator.
    fn set_status(&self, on: bool);
}

// vim: ts=4 sw=4 expandtab
