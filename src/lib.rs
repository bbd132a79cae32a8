// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timing and control core of a phase angle AC lamp dimmer.
//!
//! The core runs almost entirely in interrupt context.
//! It is independent of the MCU. The hardware is accessed through [hal::Hal].

#![no_std]

#[cfg(test)]
extern crate std;

pub mod analog;
pub mod debounce;
pub mod dimtab;
pub mod fade;
pub mod fixpt;
pub mod hal;
pub mod inputs;
pub mod mains;
pub mod mutex;
pub mod opstate;
pub mod system;
pub mod timer;
pub mod triac;

#[cfg(test)]
mod testhal;

pub use crate::{
    hal::{Edge, Hal},
    inputs::InputSet,
    system::System,
};

// vim: ts=4 sw=4 expandtab
