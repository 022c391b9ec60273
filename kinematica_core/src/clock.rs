// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clock source selection and the [`Clock`] trait.
//!
//! Backends probe the host once for a monotonic high-resolution timer and
//! fall back to wall-clock time (millisecond resolution) when none exists.
//! [`ClockSource::select`] encodes that preference order; the backend caches
//! the result for the life of the process.
//!
//! Wall clocks can step backwards. [`NonDecreasing`] wraps any [`Clock`] and
//! clamps reads so consumers never observe time running in reverse.

use alloc::rc::Rc;
use core::cell::Cell;

use crate::time::{HostTime, Timebase};

/// Which time-reading function a backend selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockSource {
    /// Monotonic high-resolution timer (e.g. `CLOCK_MONOTONIC`,
    /// `performance.now()`).
    Monotonic,
    /// Wall-clock time with millisecond resolution (e.g. `Date.now()`).
    WallClock,
}

impl ClockSource {
    /// Sources in preference order.
    pub const PREFERENCE: [Self; 2] = [Self::Monotonic, Self::WallClock];

    /// Picks the first available source in [`PREFERENCE`](Self::PREFERENCE)
    /// order.
    ///
    /// `is_available` is only consulted for sources that can be missing;
    /// [`WallClock`](Self::WallClock) is always available, so selection
    /// cannot fail.
    #[must_use]
    pub fn select(mut is_available: impl FnMut(Self) -> bool) -> Self {
        Self::PREFERENCE
            .into_iter()
            .find(|&source| source == Self::WallClock || is_available(source))
            .unwrap_or(Self::WallClock)
    }

    /// Returns `true` if the host guarantees this source never decreases.
    #[must_use]
    pub const fn is_monotonic(self) -> bool {
        matches!(self, Self::Monotonic)
    }

    /// Short label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monotonic => "monotonic",
            Self::WallClock => "wall-clock",
        }
    }
}

/// A readable time source.
pub trait Clock {
    /// Returns the current time in this clock's ticks.
    fn now(&self) -> HostTime;

    /// Returns the tick-to-nanosecond ratio for [`now`](Self::now).
    fn timebase(&self) -> Timebase;

    /// Returns which source backs this clock.
    fn source(&self) -> ClockSource;

    /// Returns the current time as fractional milliseconds.
    ///
    /// The value is always finite.
    fn now_millis(&self) -> f64 {
        self.now().to_millis_f64(self.timebase())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> HostTime {
        (**self).now()
    }

    fn timebase(&self) -> Timebase {
        (**self).timebase()
    }

    fn source(&self) -> ClockSource {
        (**self).source()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> HostTime {
        (**self).now()
    }

    fn timebase(&self) -> Timebase {
        (**self).timebase()
    }

    fn source(&self) -> ClockSource {
        (**self).source()
    }
}

/// Clamps reads of the wrapped clock so they never decrease.
///
/// For a monotonic source this is a pass-through; for a wall clock it holds
/// the last reported value until the host clock catches up again.
#[derive(Debug)]
pub struct NonDecreasing<C> {
    inner: C,
    floor: Cell<HostTime>,
}

impl<C: Clock> NonDecreasing<C> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            floor: Cell::new(HostTime(0)),
        }
    }

    /// Returns the wrapped clock.
    #[must_use]
    pub fn get_ref(&self) -> &C {
        &self.inner
    }
}

impl<C: Clock> Clock for NonDecreasing<C> {
    fn now(&self) -> HostTime {
        let t = self.inner.now().max(self.floor.get());
        self.floor.set(t);
        t
    }

    fn timebase(&self) -> Timebase {
        self.inner.timebase()
    }

    fn source(&self) -> ClockSource {
        self.inner.source()
    }
}
