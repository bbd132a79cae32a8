// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Free running 16 bit timer with 1 us per tick.
pub const TIMER_TICK_US: u8 = 1;

/// Absolute 16 bit timer value.
///
/// Comparisons are done in wrapping arithmetic.
/// Two stamps can only be compared, if they are less than half
/// of the timer range apart.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct Timestamp(pub u16);

impl Timestamp {
    #[inline]
    pub const fn new() -> Self {
        Timestamp(0)
    }

    #[inline]
    pub const fn from_ticks(ticks: u16) -> Self {
        Timestamp(ticks)
    }

    #[inline]
    pub const fn to_ticks(self) -> u16 {
        self.0
    }
}

impl Default for Timestamp {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Ord for Timestamp {
    #[inline]
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        if self.0 == other.0 {
            core::cmp::Ordering::Equal
        } else if self.0.wrapping_sub(other.0) & (1 << (u16::BITS - 1)) == 0 {
            core::cmp::Ordering::Greater
        } else {
            core::cmp::Ordering::Less
        }
    }
}

impl PartialOrd for Timestamp {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl core::ops::Add<RelTimestamp> for Timestamp {
    type Output = Self;

    #[inline]
    fn add(self, other: RelTimestamp) -> Self::Output {
        self.0.wrapping_add(other.0 as u16).into()
    }
}

impl core::ops::Sub for Timestamp {
    type Output = RelTimestamp;

    #[inline]
    fn sub(self, other: Self) -> Self::Output {
        (self.0.wrapping_sub(other.0) as i16).into()
    }
}

impl From<u16> for Timestamp {
    #[inline]
    fn from(stamp: u16) -> Self {
        Timestamp(stamp)
    }
}

impl From<Timestamp> for u16 {
    #[inline]
    fn from(stamp: Timestamp) -> Self {
        stamp.0
    }
}

/// Signed distance between two [Timestamp]s.
#[derive(PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Debug)]
pub struct RelTimestamp(pub i16);

impl RelTimestamp {
    #[inline]
    pub const fn new() -> Self {
        RelTimestamp(0)
    }

    #[inline]
    pub const fn from_ticks(ticks: i16) -> Self {
        RelTimestamp(ticks)
    }

    #[inline]
    pub const fn from_micros(us: i32) -> Self {
        RelTimestamp((us / TIMER_TICK_US as i32) as i16)
    }

    #[inline]
    pub const fn to_ticks(self) -> i16 {
        self.0
    }

    #[inline]
    pub const fn div(self, d: i16) -> Self {
        RelTimestamp(self.0 / d)
    }

    #[inline]
    pub const fn abs(self) -> Self {
        RelTimestamp(self.0.saturating_abs())
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Default for RelTimestamp {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl core::ops::Add<RelTimestamp> for RelTimestamp {
    type Output = Self;

    #[inline]
    fn add(self, other: RelTimestamp) -> Self::Output {
        self.0.wrapping_add(other.0).into()
    }
}

impl core::ops::Sub for RelTimestamp {
    type Output = RelTimestamp;

    #[inline]
    fn sub(self, other: Self) -> Self::Output {
        self.0.wrapping_sub(other.0).into()
    }
}

impl From<i16> for RelTimestamp {
    #[inline]
    fn from(relstamp: i16) -> Self {
        RelTimestamp(relstamp)
    }
}

impl From<RelTimestamp> for i16 {
    #[inline]
    fn from(relstamp: RelTimestamp) -> Self {
        relstamp.0
    }
}


// vim: ts=4 sw=4 expandtab
