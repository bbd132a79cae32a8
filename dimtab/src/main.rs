// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![forbid(unsafe_code)]

use anyhow::{self as ah, Context as _, format_err as err};
use clap::{Parser, ValueEnum};
use std::{f64::consts::PI, fmt::Write as _};

/// Power of a full half-wave in the units of `angle_to_power`.
const MAX_POWER: f64 = PI / 2.0;

/// Newton iterations before giving up.
const MAX_ITERATIONS: u32 = 100;

#[derive(ValueEnum, Copy, Clone, PartialEq, Eq, Debug)]
enum Format {
    Rust,
    C,
}

/// Generate the dimming table of a resistive load.
#[derive(Parser, Debug)]
struct Opts {
    /// Table resolution. The table has 2^BITS + 1 entries.
    #[arg(short, long, default_value_t = 6)]
    bits: u32,

    /// Newton's method tolerance of the power.
    #[arg(short = 'e', long, default_value_t = 1e-7)]
    max_error: f64,

    /// Output language.
    #[arg(short, long, value_enum, default_value_t = Format::Rust)]
    format: Format,
}

/// Power delivered to a resistive load by conduction over `angle` radians
/// of a half-wave.
fn angle_to_power(angle: f64) -> f64 {
    0.5 * angle - 0.25 * (angle * 2.0).sin()
}

/// Derivative of [angle_to_power].
fn angle_to_power_slope(angle: f64) -> f64 {
    let s = angle.sin();
    s * s
}

/// Get the conduction angle that delivers `power`.
fn power_to_angle(power: f64, max_error: f64) -> ah::Result<f64> {
    let mut estim = PI / 2.0;
    for _ in 0..MAX_ITERATIONS {
        let error = angle_to_power(estim) - power;
        if error.abs() <= max_error {
            return Ok(estim);
        }
        estim -= error / angle_to_power_slope(estim);
    }
    Err(err!(
        "Newton's method did not converge for power {power} within {MAX_ITERATIONS} iterations"
    ))
}

#[derive(Clone, Debug)]
struct Entry {
    /// Trigger delay as 0.16 fraction of the half-wave.
    delay: u16,
    /// Linear power at this entry.
    power: f64,
    /// Firing angle in degrees.
    firing_deg: f64,
}

fn gen_table(bits: u32, max_error: f64) -> ah::Result<Vec<Entry>> {
    // The low end bias exceeds full power for smaller tables.
    if !(6..=12).contains(&bits) {
        return Err(err!("Table bits must be in the range 6..=12"));
    }
    if !(max_error > 0.0 && max_error < 1e-2) {
        return Err(err!("Invalid maximum error {max_error}"));
    }
    let size = (1_usize << bits) + 1;
    let last = (size - 1) as f64;

    (0..size)
        .map(|i| {
            // Biased to avoid a pot range at the low end,
            // where the lamp is basically off.
            let power = (i as f64 / (last + 0.55338)) + 0.545 / last;
            let angle = power_to_angle(power * power * MAX_POWER, max_error)
                .with_context(|| format!("Table entry {i}"))?;
            let delay = 65535.0 - angle * 65535.0 / PI;
            Ok(Entry {
                delay: (delay + 0.5).floor().clamp(1.0, 65535.0) as u16,
                power,
                firing_deg: 180.0 - angle.to_degrees(),
            })
        })
        .collect()
}

fn format_table(table: &[Entry], format: Format) -> ah::Result<String> {
    let mut out = String::new();
    for entry in table {
        let (delay, power, deg) = (entry.delay, entry.power, entry.firing_deg);
        match format {
            Format::Rust => writeln!(out, "    {delay}, // {power:.6}: {deg:.3} deg")?,
            Format::C => writeln!(out, "    {delay}, /* {power:.6}: {deg:.3} deg */")?,
        }
    }
    Ok(out)
}

fn main() -> ah::Result<()> {
    let opts = Opts::parse();

    let table = gen_table(opts.bits, opts.max_error)?;
    if table.windows(2).any(|w| w[0].delay <= w[1].delay) {
        eprintln!("Warning: The table is not strictly monotonic. Reduce the resolution.");
    }
    print!("{}", format_table(&table, opts.format)?);
    Ok(())
}


// vim: ts=4 sw=4 expandtab
