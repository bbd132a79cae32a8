// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    hal::Hal,
    mutex::{IrqCtx, IrqCtxCell},
};

/// Low end bias of the potentiometer.
///
/// The lamp shall never look completely dark at the minimum pot position.
pub const POT_OFFSET: u16 = 0x0400;

const ADC_BITS: u32 = 10;
const ADC_MASK: u16 = (1 << ADC_BITS) - 1;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum PotState {
    Off,
    Startup,
    Running,
}

/// Potentiometer sampler.
pub struct Pot {
    state: IrqCtxCell<PotState>,
    avg: IrqCtxCell<u16>,
}

impl Pot {
    pub const fn new() -> Self {
        Self {
            state: IrqCtxCell::new(PotState::Off),
            avg: IrqCtxCell::new(0),
        }
    }

    /// Switch sampling on or off.
    pub fn enable(&self, c: &IrqCtx<'_>, hal: &impl Hal, enable: bool) {
        match (enable, self.state.get(c)) {
            (true, PotState::Off) => {
                hal.adc_enable(true);
                hal.adc_start();
                self.state.set(c, PotState::Startup);
            }
            (false, PotState::Startup | PotState::Running) => {
                hal.adc_enable(false);
                self.state.set(c, PotState::Off);
            }
            _ => (),
        }
    }

    /// No sample has been taken since enabling.
    pub fn is_starting(&self, c: &IrqCtx<'_>) -> bool {
        self.state.get(c) == PotState::Startup
    }

    /// Harvest a finished conversion.
    ///
    /// Returns the adjusted power value, if a new sample was taken.
    pub fn run(&self, c: &IrqCtx<'_>, hal: &impl Hal) -> Option<u16> {
        let state = self.state.get(c);
        if state == PotState::Off {
            return None;
        }
        let raw = hal.adc_result()?;
        let sample = (raw & ADC_MASK) << (16 - ADC_BITS);

        let avg = if state == PotState::Startup {
            self.state.set(c, PotState::Running);
            sample
        } else {
            ((self.avg.get(c) as u32 * 7 + sample as u32) / 8) as u16
        };
        self.avg.set(c, avg);

        hal.adc_start();

        Some(avg.saturating_add(POT_OFFSET))
    }
}


// vim: ts=4 sw=4 expandtab
