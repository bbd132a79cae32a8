// -*- coding: utf-8 -*-
// Copyright (C) 2025 Michael Büsch <m@bues.ch>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::Cell;

pub use critical_section::{CriticalSection, Mutex};

macro_rules! define_context {
    ($name:ident) => {
        pub struct $name<'cs>(CriticalSection<'cs>);

        impl<'cs> $name<'cs> {
            /// Create a new context.
            ///
            /// # SAFETY
            ///
            /// This may only be called from the corresponding context.
            /// `MainCtx` may only be constructed from the background loop
            /// and `IrqCtx` may only be constructed from ISRs.
            #[inline(always)]
            pub unsafe fn new() -> Self {
                // SAFETY: This cs is only used with the context-bound cells below.
                //         The IRQ safety is upheld by the context machinery instead.
                //
                //         A `MainCtxCell` can only be accessed with a `MainCtx`
                //         and an `IrqCtxCell` can only be accessed with an `IrqCtx`.
                //         Interrupts never nest, so there is no concurrency
                //         between two holders of an `IrqCtx`.
                let cs = unsafe { CriticalSection::new() };
                fence();
                Self(cs)
            }
        }

        impl<'cs> Drop for $name<'cs> {
            #[inline(always)]
            fn drop(&mut self) {
                fence();
            }
        }
    };
}

define_context!(MainCtx);
define_context!(IrqCtx);

impl<'cs> IrqCtx<'cs> {
    /// Get the `CriticalSection` that belongs to this context.
    ///
    /// Interrupt handlers run with interrupts disabled.
    /// Therefore, this is a real critical section that may be used
    /// to access [SharedCell]s.
    #[inline(always)]
    pub fn cs(&self) -> CriticalSection<'cs> {
        self.0
    }
}

/// Optimization and reordering fence.
#[inline(always)]
pub fn fence() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

macro_rules! define_cell {
    ($name:ident, $ctx:ident) => {
        pub struct $name<T> {
            inner: Mutex<Cell<T>>,
        }

        impl<T> $name<T> {
            #[inline]
            pub const fn new(inner: T) -> Self {
                Self {
                    inner: Mutex::new(Cell::new(inner)),
                }
            }

            #[inline]
            #[allow(dead_code)]
            pub fn replace(&self, c: &$ctx<'_>, inner: T) -> T {
                self.inner.borrow(c.0).replace(inner)
            }
        }

        impl<T: Copy> $name<T> {
            #[inline]
            pub fn get(&self, c: &$ctx<'_>) -> T {
                self.inner.borrow(c.0).get()
            }

            #[inline]
            pub fn set(&self, c: &$ctx<'_>, inner: T) {
                self.inner.borrow(c.0).set(inner);
            }
        }
    };
}

define_cell!(MainCtxCell, MainCtx);
define_cell!(IrqCtxCell, IrqCtx);

/// Cell that is accessed from both the background loop and interrupts.
///
/// Access needs a real [CriticalSection].
/// The background loop has to mask interrupts with `critical_section::with`
/// and interrupt handlers use [IrqCtx::cs].
pub struct SharedCell<T> {
    inner: Mutex<Cell<T>>,
}

impl<T> SharedCell<T> {
    #[inline]
    pub const fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(inner)),
        }
    }

    #[inline]
    pub fn replace(&self, cs: CriticalSection<'_>, inner: T) -> T {
        self.inner.borrow(cs).replace(inner)
    }
}

impl<T: Copy> SharedCell<T> {
    #[inline]
    pub fn get(&self, cs: CriticalSection<'_>) -> T {
        self.inner.borrow(cs).get()
    }

    #[inline]
    pub fn set(&self, cs: CriticalSection<'_>, inner: T) {
        self.inner.borrow(cs).set(inner);
    }
}

/// Reset the system.
#[inline(always)]
#[allow(clippy::empty_loop)]
pub fn reset_system() -> ! {
    loop {
        // Wait for the watchdog timer to trigger and reset the system.
        // We don't need to disable interrupts here.
        // No interrupt will reset the watchdog timer.
    }
}

#[cfg(test)]
pub mod test_ctx {
    use super::*;

    pub fn irq<'cs>() -> IrqCtx<'cs> {
        // SAFETY: Unit tests are single threaded per test and
        //         simulate the interrupt context sequentially.
        unsafe { IrqCtx::new() }
    }

    pub fn main<'cs>() -> MainCtx<'cs> {
        // SAFETY: See above.
        unsafe { MainCtx::new() }
    }
}

// vim: ts=4 sw=4 expandtab
