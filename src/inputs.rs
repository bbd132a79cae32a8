// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use derive_more::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor};

/// Set of the digital control inputs.
///
/// When used as raw pin levels, a set bit means the pin reads high.
/// All inputs are pulled up and active low,
/// so a set bit means the switch is released.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Debug,
    Default,
    BitAnd,
    BitOr,
    BitXor,
    BitAndAssign,
    BitOrAssign,
)]
pub struct InputSet(pub u8);

impl InputSet {
    pub const NONE: Self = Self(0);
    /// Off switch.
    pub const OFF_SWITCH: Self = Self(1 << 0);
    /// On switch.
    pub const ON_SWITCH: Self = Self(1 << 1);
    /// Trigger input.
    pub const TRIGGER: Self = Self(1 << 2);
    pub const SWITCHES: Self = Self(Self::OFF_SWITCH.0 | Self::ON_SWITCH.0);
    pub const ALL: Self = Self(Self::SWITCHES.0 | Self::TRIGGER.0);

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}


// vim: ts=4 sw=4 expandtab
