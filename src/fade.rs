// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::mutex::{IrqCtx, IrqCtxCell};

/// Per-tick power delta for the fast on/off ramps.
pub const FADE_STEP_FAST: u16 = 0x0800;
/// Per-tick power delta for the slow triggered fade-up.
pub const FADE_STEP_SLOW: u16 = 1;

/// Two's complement power delta per tick.
///
/// Values of `0x8000` and above are negative.
/// Zero means that no fade is running.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct FadeStep(u16);

impl FadeStep {
    pub const NONE: Self = Self(0);

    /// Increase by `n` per tick.
    pub const fn up(n: u16) -> Self {
        assert!(n < 0x8000);
        Self(n)
    }

    /// Decrease by `n` per tick.
    pub const fn down(n: u16) -> Self {
        assert!(n <= 0x8000);
        Self(n.wrapping_neg())
    }

    pub const fn is_active(self) -> bool {
        self.0 != 0
    }

    pub const fn is_decreasing(self) -> bool {
        self.0 >= 0x8000
    }

    /// Absolute delta per tick.
    pub const fn magnitude(self) -> u16 {
        if self.is_decreasing() {
            self.0.wrapping_neg()
        } else {
            self.0
        }
    }
}

/// Advance `power` by one `step` towards `target`.
///
/// Returns the new power and the step to use for the next tick.
/// The fade ends, if the new value reached the target or went past it.
/// Going past includes wrapping around the end of the power range.
pub const fn fade_step(power: u16, target: u16, step: FadeStep) -> (u16, FadeStep) {
    if !step.is_active() {
        return (power, step);
    }
    let new = power.wrapping_add(step.0);
    let crossed = if step.is_decreasing() {
        new > power || new <= target
    } else {
        new < power || new >= target
    };
    if crossed {
        (target, FadeStep::NONE)
    } else {
        (new, step)
    }
}

/// Brightness fade engine.
pub struct Fade {
    target: IrqCtxCell<u16>,
    step: IrqCtxCell<FadeStep>,
}

impl Fade {
    pub const fn new() -> Self {
        Self {
            target: IrqCtxCell::new(0),
            step: IrqCtxCell::new(FadeStep::NONE),
        }
    }

    /// Start a new fade, replacing any running one.
    pub fn load(&self, c: &IrqCtx<'_>, target: u16, step: FadeStep) {
        self.target.set(c, target);
        self.step.set(c, step);
    }

    /// Steer a running fade to a new target.
    pub fn set_target(&self, c: &IrqCtx<'_>, target: u16) {
        self.target.set(c, target);
    }

    pub fn is_active(&self, c: &IrqCtx<'_>) -> bool {
        self.step.get(c).is_active()
    }

    /// Run one fade tick on `power`.
    pub fn run(&self, c: &IrqCtx<'_>, power: u16) -> u16 {
        let (power, step) = fade_step(power, self.target.get(c), self.step.get(c));
        self.step.set(c, step);
        power
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mutex::test_ctx;

    fn run_fade(mut power: u16, target: u16, step: FadeStep) -> u32 {
        let mut step = step;
        let mut ticks = 0;
        let up = !step.is_decreasing();
        while step.is_active() {
            let prev = power;
            (power, step) = fade_step(power, target, step);
            if up {
                assert!(power >= prev && power <= target);
            } else {
                assert!(power <= prev && power >= target);
            }
            ticks += 1;
            assert!(ticks <= 0x10000);
        }
        assert_eq!(power, target);
        ticks
    }

    fn expected_ticks(p0: u16, target: u16, step: FadeStep) -> u32 {
        (p0 as u32).abs_diff(target as u32).div_ceil(step.magnitude() as u32)
    }

    #[test]
    fn test_step_type() {
        assert!(!FadeStep::NONE.is_active());
        assert!(FadeStep::up(1).is_active());
        assert!(!FadeStep::up(0x7FFF).is_decreasing());
        assert!(FadeStep::down(1).is_decreasing());
        assert_eq!(FadeStep::down(1), FadeStep(0xFFFF));
        assert_eq!(FadeStep::down(FADE_STEP_FAST).magnitude(), FADE_STEP_FAST);
        assert_eq!(FadeStep::down(0x8000).magnitude(), 0x8000);
    }

    #[test]
    fn test_fade_ticks() {
        let cases = [
            (0, 0xFFFF, FadeStep::up(FADE_STEP_FAST)),
            (100, 0x1000, FadeStep::up(0x100)),
            (0x1000, 0x1000 + 3 * 0x55, FadeStep::up(0x55)),
            (0xFFFF, 0, FadeStep::down(FADE_STEP_FAST)),
            (0x8000, 0x7000, FadeStep::down(0x300)),
            (5, 0, FadeStep::down(0x7FFF)),
            (0xFFF0, 0xFFFF, FadeStep::up(0x7000)),
            (0, 1000, FadeStep::up(FADE_STEP_SLOW)),
        ];
        for (p0, target, step) in cases {
            assert_eq!(
                run_fade(p0, target, step),
                expected_ticks(p0, target, step),
                "p0={p0} target={target} step={step:?}"
            );
        }
    }

    #[test]
    fn test_slow_full_fade() {
        let step = FadeStep::up(FADE_STEP_SLOW);
        assert_eq!(run_fade(0, 0xFFFF, step), 0xFFFF);
    }

    #[test]
    fn test_fade_engine() {
        let c = test_ctx::irq();
        let fade = Fade::new();
        assert!(!fade.is_active(&c));
        assert_eq!(fade.run(&c, 1234), 1234);

        fade.load(&c, 0xFFFF, FadeStep::up(0x4000));
        assert!(fade.is_active(&c));
        let mut power = fade.run(&c, 0);
        assert_eq!(power, 0x4000);

        // Steer downwards while rising.
        fade.set_target(&c, 0x6000);
        power = fade.run(&c, power);
        assert_eq!(power, 0x6000);
        assert!(!fade.is_active(&c));

        // Target behind the current power ends the fade immediately.
        fade.load(&c, 0x1000, FadeStep::up(1));
        assert_eq!(fade.run(&c, 0x2000), 0x1000);
        assert!(!fade.is_active(&c));
    }
}

// vim: ts=4 sw=4 expandtab
