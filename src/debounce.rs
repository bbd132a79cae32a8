// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::mutex::{IrqCtx, IrqCtxCell};

/// Number of stable ticks needed to commit an input change.
pub const DEBOUNCE_LEN: u8 = 5;

/// Raw value stabilization filter.
///
/// The filter samples once per tick while active.
/// A sample that differs from the previous one restarts the count.
/// `LEN` identical samples in a row commit the value.
pub struct Debounce<T, const LEN: u8> {
    active: IrqCtxCell<bool>,
    count: IrqCtxCell<u8>,
    value: IrqCtxCell<T>,
}

impl<T: Copy + PartialEq, const LEN: u8> Debounce<T, LEN> {
    /// Create a filter that is active from the start.
    pub const fn new(initial: T) -> Self {
        Self {
            active: IrqCtxCell::new(true),
            count: IrqCtxCell::new(LEN),
            value: IrqCtxCell::new(initial),
        }
    }

    /// (Re)start filtering.
    pub fn start(&self, c: &IrqCtx<'_>) {
        self.active.set(c, true);
        self.count.set(c, LEN);
    }

    pub fn is_active(&self, c: &IrqCtx<'_>) -> bool {
        self.active.get(c)
    }

    /// Feed one raw sample into the filter.
    ///
    /// Returns the candidate value once it has been stable for `LEN` ticks.
    /// The candidate must be confirmed with [Debounce::verify].
    pub fn run(&self, c: &IrqCtx<'_>, sample: T) -> Option<T> {
        if !self.active.get(c) {
            return None;
        }
        if sample != self.value.get(c) {
            self.value.set(c, sample);
            self.count.set(c, LEN);
            return None;
        }
        let count = self.count.get(c).saturating_sub(1);
        self.count.set(c, count);
        if count == 0 { Some(sample) } else { None }
    }

    /// Confirm a candidate returned by [Debounce::run] with a fresh sample.
    ///
    /// On success the filter goes idle.
    /// On mismatch the new sample is remembered and the count restarts.
    pub fn verify(&self, c: &IrqCtx<'_>, sample: T) -> bool {
        if sample == self.value.get(c) {
            self.active.set(c, false);
            true
        } else {
            self.value.set(c, sample);
            self.count.set(c, LEN);
            false
        }
    }
}


// vim: ts=4 sw=4 expandtab
