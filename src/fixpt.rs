// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Multiply two unsigned 16 bit values and return the upper 16 bits
/// of the 32 bit product.
///
/// If `b` is interpreted as a fraction in the range [0, 1),
/// this is `a * b / 65536` rounded towards zero.
#[inline(never)]
pub const fn mulhi16(a: u16, b: u16) -> u16 {
    ((a as u32 * b as u32) >> 16) as u16
}


// vim: ts=4 sw=4 expandtab
