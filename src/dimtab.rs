// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{fixpt::mulhi16, timer::RelTimestamp};

/// Dimming table resolution in bits.
pub const DIMTAB_BITS: u32 = 6;
/// Number of entries in the dimming table.
pub const DIMTAB_SIZE: usize = (1 << DIMTAB_BITS) + 1;

/// Trigger delay as fraction of the mains half-wave, indexed by power.
///
/// Generated by `dimtab --bits 6`.
/// Comment format: `power fraction: firing angle`.
#[rustfmt::skip]
pub const DIMTAB: [u16; DIMTAB_SIZE] = [
    64076, // 0.008516: 175.992 deg
    62621, // 0.024007: 171.996 deg
    61468, // 0.039498: 168.831 deg
    60458, // 0.054989: 166.054 deg
    59535, // 0.070480: 163.519 deg
    58673, // 0.085971: 161.153 deg
    57858, // 0.101462: 158.914 deg
    57079, // 0.116953: 156.774 deg
    56329, // 0.132444: 154.715 deg
    55603, // 0.147935: 152.722 deg
    54898, // 0.163426: 150.784 deg
    54210, // 0.178917: 148.894 deg
    53536, // 0.194408: 147.044 deg
    52875, // 0.209899: 145.228 deg
    52225, // 0.225390: 143.443 deg
    51585, // 0.240881: 141.684 deg
    50953, // 0.256373: 139.947 deg
    50327, // 0.271864: 138.230 deg
    49708, // 0.287355: 136.530 deg
    49094, // 0.302846: 134.844 deg
    48485, // 0.318337: 133.170 deg
    47879, // 0.333828: 131.506 deg
    47276, // 0.349319: 129.850 deg
    46675, // 0.364810: 128.200 deg
    46076, // 0.380301: 126.555 deg
    45479, // 0.395792: 124.913 deg
    44881, // 0.411283: 123.272 deg
    44284, // 0.426774: 121.631 deg
    43686, // 0.442265: 119.988 deg
    43087, // 0.457756: 118.343 deg
    42486, // 0.473247: 116.692 deg
    41883, // 0.488738: 115.036 deg
    41277, // 0.504229: 113.372 deg
    40667, // 0.519720: 111.698 deg
    40054, // 0.535212: 110.014 deg
    39436, // 0.550703: 108.317 deg
    38813, // 0.566194: 106.605 deg
    38184, // 0.581685: 104.878 deg
    37549, // 0.597176: 103.132 deg
    36905, // 0.612667: 101.365 deg
    36254, // 0.628158: 99.576 deg
    35593, // 0.643649: 97.762 deg
    34923, // 0.659140: 95.919 deg
    34240, // 0.674631: 94.045 deg
    33545, // 0.690122: 92.137 deg
    32837, // 0.705613: 90.190 deg
    32112, // 0.721104: 88.200 deg
    31370, // 0.736595: 86.163 deg
    30609, // 0.752086: 84.072 deg
    29826, // 0.767577: 81.921 deg
    29018, // 0.783068: 79.702 deg
    28182, // 0.798559: 77.406 deg
    27314, // 0.814051: 75.022 deg
    26409, // 0.829542: 72.537 deg
    25461, // 0.845033: 69.932 deg
    24462, // 0.860524: 67.187 deg
    23401, // 0.876015: 64.273 deg
    22265, // 0.891506: 61.153 deg
    21034, // 0.906997: 57.772 deg
    19680, // 0.922488: 54.052 deg
    18157, // 0.937979: 49.870 deg
    16387, // 0.953470: 45.009 deg
    14210, // 0.968961: 39.028 deg
    11182, // 0.984452: 30.712 deg
    1695, // 0.999943: 4.655 deg
];

/// The dimming curve of a resistive load.
pub const DIMCURVE: DimCurve<'static> = DimCurve::new(DIMTAB_BITS, &DIMTAB);

/// Piecewise linear dimming curve.
///
/// Translates the 16 bit linear power value into the
/// TRIAC trigger delay as 0.16 fraction of the mains half-wave.
pub struct DimCurve<'a> {
    bits: u32,
    table: &'a [u16],
}

impl<'a> DimCurve<'a> {
    /// Create a curve from a table with `2^bits + 1` monotonic entries.
    pub const fn new(bits: u32, table: &'a [u16]) -> Self {
        assert!(bits >= 1 && bits < 16);
        assert!(table.len() == (1 << bits) + 1);
        Self { bits, table }
    }

    /// Get the trigger delay fraction for the given `power`.
    ///
    /// The upper `bits` of `power` select the table index.
    /// The lower bits interpolate linearly towards the next entry.
    pub fn delay_fraction(&self, power: u16) -> u16 {
        let index = (power >> (16 - self.bits)) as usize;
        let frac = power << self.bits;

        let left = self.table[index];
        let right = self.table[index + 1];
        if left >= right {
            left - mulhi16(left - right, frac)
        } else {
            left + mulhi16(right - left, frac)
        }
    }

    /// Get the trigger delay after the zero crossing for the given `power`.
    ///
    /// Zero power returns a zero delay, which disables the TRIAC.
    pub fn triac_delay(&self, power: u16, half_period: RelTimestamp) -> RelTimestamp {
        if power == 0 || half_period.to_ticks() <= 0 {
            RelTimestamp::new()
        } else {
            let frac = self.delay_fraction(power);
            let half_period = half_period.to_ticks() as u16;
            RelTimestamp::from_ticks(mulhi16(half_period, frac) as i16)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const HALF_60HZ: RelTimestamp = RelTimestamp::from_ticks(8333);

    #[test]
    fn test_table_monotonic() {
        for pair in DIMTAB.windows(2) {
            assert!(pair[0] > pair[1]);
        }
        assert_ne!(DIMTAB[DIMTAB_SIZE - 1], 0);
    }

    #[test]
    fn test_lookup_monotonic() {
        let mut prev = DIMCURVE.delay_fraction(0);
        for power in 1..=u16::MAX {
            let frac = DIMCURVE.delay_fraction(power);
            assert!(frac <= prev, "inversion at power {power}");
            prev = frac;
        }
    }

    #[test]
    fn test_lookup_table_points() {
        for (i, entry) in DIMTAB.iter().take(DIMTAB_SIZE - 1).enumerate() {
            let power = (i as u16) << (16 - DIMTAB_BITS);
            assert_eq!(DIMCURVE.delay_fraction(power), *entry);
        }
        // Halfway between two entries.
        let power = (3 << (16 - DIMTAB_BITS)) | (1 << (15 - DIMTAB_BITS));
        let expected = DIMTAB[3] - (DIMTAB[3] - DIMTAB[4]) / 2;
        assert_eq!(DIMCURVE.delay_fraction(power), expected);
    }

    #[test]
    fn test_rising_table() {
        let table = [0, 1000, 3000];
        let curve = DimCurve::new(1, &table);
        assert_eq!(curve.delay_fraction(0), 0);
        assert_eq!(curve.delay_fraction(0x4000), 500);
        assert_eq!(curve.delay_fraction(0x8000), 1000);
        assert_eq!(curve.delay_fraction(0xC000), 2000);
    }

    #[test]
    fn test_triac_delay() {
        assert_eq!(DIMCURVE.triac_delay(0, HALF_60HZ), RelTimestamp::new());
        assert_eq!(
            DIMCURVE.triac_delay(1234, RelTimestamp::new()),
            RelTimestamp::new()
        );

        let full = DIMCURVE.triac_delay(u16::MAX, HALF_60HZ).to_ticks();
        let last = mulhi16(8333, DIMTAB[DIMTAB_SIZE - 1]) as i16;
        assert!(full >= last && full <= last + 2);

        let least = DIMCURVE.triac_delay(1, HALF_60HZ).to_ticks();
        assert!(least < 8333);
        assert_eq!(least, mulhi16(8333, DIMTAB[0]) as i16);

        let mut prev = least;
        for power in (1..=u16::MAX).step_by(97) {
            let delay = DIMCURVE.triac_delay(power, HALF_60HZ).to_ticks();
            assert!(delay <= prev);
            assert!(delay > 0);
            prev = delay;
        }
    }
}

// vim: ts=4 sw=4 expandtab
