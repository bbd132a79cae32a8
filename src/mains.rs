// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    hal::{Edge, Hal},
    mutex::{IrqCtx, IrqCtxCell},
    timer::{RelTimestamp, Timestamp},
};

/// Capture hold-off after the falling opto-coupler edge.
pub const ZC_FALL_HOLDOFF: RelTimestamp = RelTimestamp::from_micros(1000);
/// Capture hold-off after the rising opto-coupler edge.
///
/// Must be long enough to end in the next half-wave.
pub const ZC_RISE_HOLDOFF: RelTimestamp = RelTimestamp::from_micros(4000);

/// Shortest plausible mains half-wave (66 Hz).
pub const HALF_PERIOD_MIN: RelTimestamp = RelTimestamp::from_micros(1_000_000 / 66 / 2);
/// Longest plausible mains half-wave (45 Hz).
pub const HALF_PERIOD_MAX: RelTimestamp = RelTimestamp::from_micros(1_000_000 / 45 / 2);

/// Number of plausible measurements in a row before the mains is locked.
const LOCK_COUNT: u8 = 2;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum ZcPhase {
    /// Waiting for the falling edge.
    Fall,
    /// Falling edge hold-off running.
    FallHoldoff,
    /// Waiting for the rising edge.
    Rise,
    /// Rising edge hold-off running.
    RiseHoldoff,
}

/// Result of one full mains period.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Measurement {
    /// The zero crossing following the last opto-coupler pulse.
    pub crossing: Timestamp,
    pub half: RelTimestamp,
    pub quarter: RelTimestamp,
    pub locked: bool,
}

/// Mains zero crossing detector.
///
/// The opto-coupler pulls the capture input low around one peak
/// per mains period. The center of the pulse is the peak.
pub struct Mains {
    phase: IrqCtxCell<ZcPhase>,
    fall: IrqCtxCell<Timestamp>,
    rise: IrqCtxCell<Timestamp>,
    peak: IrqCtxCell<Timestamp>,
    half: IrqCtxCell<RelTimestamp>,
    lock: IrqCtxCell<u8>,
}

impl Mains {
    pub const fn new() -> Self {
        Self {
            phase: IrqCtxCell::new(ZcPhase::Fall),
            fall: IrqCtxCell::new(Timestamp::new()),
            rise: IrqCtxCell::new(Timestamp::new()),
            peak: IrqCtxCell::new(Timestamp::new()),
            half: IrqCtxCell::new(RelTimestamp::new()),
            lock: IrqCtxCell::new(0),
        }
    }

    /// Arm the capture unit for the first falling edge.
    pub fn init(&self, hal: &impl Hal) {
        hal.zc_arm_capture(Edge::Falling);
    }

    /// Last measured half-wave duration.
    pub fn half(&self, c: &IrqCtx<'_>) -> RelTimestamp {
        self.half.get(c)
    }

    /// Drop the lock.
    ///
    /// The next measurements have to lock again.
    pub fn unlock(&self, c: &IrqCtx<'_>) {
        self.lock.set(c, 0);
    }

    /// Capture or hold-off timeout interrupt.
    ///
    /// Returns a new measurement once per mains period.
    pub fn irq(&self, c: &IrqCtx<'_>, hal: &impl Hal) -> Option<Measurement> {
        match self.phase.get(c) {
            ZcPhase::Fall => {
                let fall = hal.zc_captured();
                self.fall.set(c, fall);
                hal.zc_arm_timeout(fall + ZC_FALL_HOLDOFF);
                self.phase.set(c, ZcPhase::FallHoldoff);
                None
            }
            ZcPhase::FallHoldoff => {
                hal.zc_arm_capture(Edge::Rising);
                self.phase.set(c, ZcPhase::Rise);
                None
            }
            ZcPhase::Rise => {
                let rise = hal.zc_captured();
                self.rise.set(c, rise);
                hal.zc_arm_timeout(rise + ZC_RISE_HOLDOFF);
                self.phase.set(c, ZcPhase::RiseHoldoff);
                None
            }
            ZcPhase::RiseHoldoff => {
                hal.zc_arm_capture(Edge::Falling);
                self.phase.set(c, ZcPhase::Fall);
                Some(self.measure(c))
            }
        }
    }

    fn measure(&self, c: &IrqCtx<'_>) -> Measurement {
        let fall = self.fall.get(c);
        let pulse = self.rise.get(c) - fall;
        let peak = fall + pulse.div(2);

        let half = (peak - self.peak.get(c)).div(2);
        let quarter = half.div(2);
        self.peak.set(c, peak);
        self.half.set(c, half);

        let plausible = half >= HALF_PERIOD_MIN && half <= HALF_PERIOD_MAX;
        let lock = if plausible {
            (self.lock.get(c) + 1).min(LOCK_COUNT)
        } else {
            0
        };
        self.lock.set(c, lock);

        Measurement {
            crossing: peak + quarter,
            half,
            quarter,
            locked: lock >= LOCK_COUNT,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{mutex::test_ctx, testhal::MockHal};

    fn period(mains: &Mains, hal: &MockHal, fall: u16, pulse: u16) -> Option<Measurement> {
        let c = test_ctx::irq();

        assert_eq!(hal.capture_edge.get(), Some(Edge::Falling));
        hal.captured.set(Timestamp(fall));
        assert_eq!(mains.irq(&c, hal), None);
        assert_eq!(hal.capture_edge.get(), None);
        assert_eq!(hal.timeout.get(), Some(Timestamp(fall.wrapping_add(1000))));

        assert_eq!(mains.irq(&c, hal), None);
        assert_eq!(hal.capture_edge.get(), Some(Edge::Rising));
        assert_eq!(hal.timeout.get(), None);

        let rise = fall.wrapping_add(pulse);
        hal.captured.set(Timestamp(rise));
        assert_eq!(mains.irq(&c, hal), None);
        assert_eq!(hal.timeout.get(), Some(Timestamp(rise.wrapping_add(4000))));

        let m = mains.irq(&c, hal);
        assert_eq!(hal.capture_edge.get(), Some(Edge::Falling));
        m
    }

    #[test]
    fn test_measure_60hz() {
        let hal = MockHal::new();
        let mains = Mains::new();
        mains.init(&hal);

        let m = period(&mains, &hal, 1000, 6000).unwrap();
        assert!(!m.locked);

        let m = period(&mains, &hal, 1000 + 16666, 6000).unwrap();
        assert!(!m.locked);
        assert_eq!(m.half, RelTimestamp(8333));

        // Wrap around the timer range.
        let mut fall: u16 = 1000 + 16666;
        for _ in 0..10 {
            fall = fall.wrapping_add(16666);
            let m = period(&mains, &hal, fall, 6000).unwrap();
            assert!(m.locked);
            assert_eq!(m.half, RelTimestamp(8333));
            assert_eq!(m.quarter, RelTimestamp(4166));
            assert_eq!(m.crossing, Timestamp(fall.wrapping_add(3000 + 4166)));
        }
        let c = test_ctx::irq();
        assert_eq!(mains.half(&c), RelTimestamp(8333));
    }

    #[test]
    fn test_lock_lost() {
        let hal = MockHal::new();
        let mains = Mains::new();
        mains.init(&hal);

        let mut fall: u16 = 0;
        let mut locked = false;
        for _ in 0..3 {
            fall = fall.wrapping_add(20000);
            locked = period(&mains, &hal, fall, 5000).unwrap().locked;
        }
        assert!(locked);
        let c = test_ctx::irq();
        assert_eq!(mains.half(&c), RelTimestamp(10000));

        // Missed pulse.
        fall = fall.wrapping_add(40000);
        let m = period(&mains, &hal, fall, 5000).unwrap();
        assert!(!m.locked);

        fall = fall.wrapping_add(20000);
        let m = period(&mains, &hal, fall, 5000).unwrap();
        assert!(!m.locked);
        fall = fall.wrapping_add(20000);
        let m = period(&mains, &hal, fall, 5000).unwrap();
        assert!(m.locked);
    }

    #[test]
    fn test_unlock() {
        let hal = MockHal::new();
        let mains = Mains::new();
        mains.init(&hal);

        let mut fall: u16 = 0;
        for _ in 0..3 {
            fall = fall.wrapping_add(16666);
            period(&mains, &hal, fall, 6000);
        }
        mains.unlock(&test_ctx::irq());

        // Plausible measurements have to lock again.
        fall = fall.wrapping_add(16666);
        let m = period(&mains, &hal, fall, 6000).unwrap();
        assert!(!m.locked);
        assert_eq!(m.half, RelTimestamp(8333));
        fall = fall.wrapping_add(16666);
        let m = period(&mains, &hal, fall, 6000).unwrap();
        assert!(m.locked);
    }
}

// vim: ts=4 sw=4 expandtab
