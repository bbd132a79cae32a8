// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    fade::{FADE_STEP_FAST, FADE_STEP_SLOW, FadeStep},
    inputs::InputSet,
};

/// Operating state of the dimmer.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OpState {
    /// Boot state. Left as soon as the inputs are stable.
    Initial,
    /// Lamp off. The trigger is ignored.
    Off,
    /// Lamp off. Waiting for the trigger.
    TrigWait,
    /// Slow fade-up. Further trigger edges are ignored.
    Triggered,
    /// Manual brightness control by the potentiometer.
    On,
}

/// Static behavior of an [OpState].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct OpStateDesc {
    /// Fade target and step loaded on entry.
    pub fade: Option<(u16, FadeStep)>,
    /// Inputs that raise edge interrupts in this state.
    pub edges: InputSet,
}

impl OpState {
    pub const fn desc(self) -> OpStateDesc {
        match self {
            OpState::Initial => OpStateDesc {
                fade: None,
                edges: InputSet::NONE,
            },
            OpState::Off => OpStateDesc {
                fade: Some((0, FadeStep::down(FADE_STEP_FAST))),
                edges: InputSet::OFF_SWITCH,
            },
            OpState::TrigWait => OpStateDesc {
                fade: Some((0, FadeStep::down(FADE_STEP_FAST))),
                edges: InputSet::ALL,
            },
            OpState::Triggered => OpStateDesc {
                fade: Some((u16::MAX, FadeStep::up(FADE_STEP_SLOW))),
                edges: InputSet::SWITCHES,
            },
            OpState::On => OpStateDesc {
                fade: Some((u16::MAX, FadeStep::up(FADE_STEP_FAST))),
                edges: InputSet::SWITCHES,
            },
        }
    }

    /// Inputs that take part in debouncing, given the committed `levels`.
    ///
    /// The trigger is only watched while both switches are active
    /// and no triggered fade is running.
    pub const fn input_mask(self, levels: InputSet) -> InputSet {
        if !matches!(self, OpState::Triggered) && !levels.intersects(InputSet::SWITCHES) {
            InputSet::ALL
        } else {
            InputSet::SWITCHES
        }
    }

    /// Get the state that follows from the debounced input `levels`.
    pub const fn next(self, levels: InputSet) -> OpState {
        if levels.intersects(InputSet::OFF_SWITCH) {
            OpState::Off
        } else if levels.intersects(InputSet::ON_SWITCH) {
            OpState::On
        } else if matches!(self, OpState::TrigWait) && levels.intersects(InputSet::TRIGGER) {
            OpState::Triggered
        } else {
            OpState::TrigWait
        }
    }

    /// Edge interrupt configuration for this state at the given `levels`.
    ///
    /// Returns the enabled inputs and the subset thereof,
    /// that currently read high and therefore wait for a falling edge.
    pub const fn edge_config(self, levels: InputSet) -> (InputSet, InputSet) {
        let enabled = self.desc().edges;
        let falling = InputSet(levels.0 & enabled.0);
        (enabled, falling)
    }

    /// The potentiometer controls the power in this state.
    pub const fn pot_enabled(self) -> bool {
        matches!(self, OpState::On)
    }
}


// vim: ts=4 sw=4 expandtab
