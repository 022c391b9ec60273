// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host time points, durations and timebase conversion.
//!
//! [`HostTime`] is a reading from whichever clock the backend selected,
//! expressed in that clock's native ticks (nanoseconds for `CLOCK_MONOTONIC`,
//! microseconds for `performance.now()`).
//!
//! [`Timebase`] carries the rational factor from ticks to nanoseconds. Frame
//! timing is reported to callers in milliseconds as `f64`, so both types also
//! convert to and from fractional milliseconds.
//!
//! Integer conversions use `u128` intermediates to avoid overflow.

use core::fmt;
use core::ops::{Add, Sub};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// A point in time expressed in backend clock ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts this host time to nanoseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Creates a [`HostTime`] from a nanosecond value and timebase.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }

    /// Converts this host time to fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn to_millis_f64(self, timebase: Timebase) -> f64 {
        timebase.ticks_to_millis_f64(self.0)
    }

    /// Creates a [`HostTime`] from fractional milliseconds.
    ///
    /// Negative, NaN and infinite inputs map to zero; values past the `u64`
    /// range saturate.
    #[inline]
    #[must_use]
    pub fn from_millis_f64(millis: f64, timebase: Timebase) -> Self {
        Self(timebase.millis_f64_to_ticks(millis))
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Saturating addition of a duration.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Rational conversion factor from ticks to nanoseconds.
///
/// `nanoseconds = ticks * numer / denom`
///
/// Each backend exposes the instance matching its clock through a
/// `timebase()` free function.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator of the ticks-to-nanoseconds ratio.
    pub numer: u32,
    /// Denominator of the ticks-to-nanoseconds ratio.
    pub denom: u32,
}

impl Timebase {
    /// Ticks are nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Ticks are microseconds.
    pub const MICROS: Self = Self {
        numer: 1000,
        denom: 1,
    };

    /// Creates a new timebase with the given numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts a tick count to nanoseconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = ticks as u128 * self.numer as u128 / self.denom as u128;
        wide as u64
    }

    /// Converts nanoseconds to a tick count.
    ///
    /// A zero numerator yields zero ticks.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        if self.numer == 0 {
            return 0;
        }
        let wide = nanos as u128 * self.denom as u128 / self.numer as u128;
        wide as u64
    }

    /// Converts a tick count to fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn ticks_to_millis_f64(self, ticks: u64) -> f64 {
        ticks as f64 * f64::from(self.numer) / f64::from(self.denom) / NANOS_PER_MILLI
    }

    /// Converts fractional milliseconds to a tick count.
    ///
    /// Non-finite and negative inputs map to zero.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "input is finite and positive; float-to-int casts saturate at u64::MAX"
    )]
    pub fn millis_f64_to_ticks(self, millis: f64) -> u64 {
        if !millis.is_finite() || millis <= 0.0 || self.numer == 0 {
            return 0;
        }
        (millis * NANOS_PER_MILLI * f64::from(self.denom) / f64::from(self.numer)) as u64
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A duration in backend clock ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts this duration to nanoseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Creates a duration from a nanosecond value and timebase.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }

    /// Converts this duration to fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn to_millis_f64(self, timebase: Timebase) -> f64 {
        timebase.ticks_to_millis_f64(self.0)
    }

    /// Creates a duration from fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn from_millis_f64(millis: f64, timebase: Timebase) -> Self {
        Self(timebase.millis_f64_to_ticks(millis))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn microsecond_timebase_converts_to_nanos() {
        let tb = Timebase::MICROS;
        assert_eq!(tb.ticks_to_nanos(1), 1000, "1 µs");
        assert_eq!(HostTime(16_667).to_nanos(tb), 16_667_000);
        assert_eq!(HostTime::from_nanos(2_000_000, tb), HostTime(2_000));
    }

    #[test]
    fn millis_conversion_is_timebase_aware() {
        let ms = HostTime(16_666_667).to_millis_f64(Timebase::NANOS);
        assert!((ms - 16.666_667).abs() < 1e-9, "got {ms}");

        let ms = HostTime(16_667).to_millis_f64(Timebase::MICROS);
        assert!((ms - 16.667).abs() < 1e-9, "got {ms}");

        assert_eq!(
            Duration::from_millis_f64(1.5, Timebase::MICROS),
            Duration(1_500)
        );
    }

    #[test]
    fn millis_to_ticks_rejects_non_finite_and_negative() {
        let tb = Timebase::NANOS;
        assert_eq!(tb.millis_f64_to_ticks(f64::NAN), 0);
        assert_eq!(tb.millis_f64_to_ticks(f64::INFINITY), 0);
        assert_eq!(tb.millis_f64_to_ticks(-3.0), 0);
        assert_eq!(tb.millis_f64_to_ticks(1e30), u64::MAX, "saturates");
    }

    #[test]
    fn overflow_safe_conversion() {
        let tb = Timebase::new(125, 3);
        let t = HostTime(u64::MAX / 2);
        // Must not panic; the u128 intermediate absorbs the multiplication.
        let _nanos = t.to_nanos(tb);
    }

    #[test]
    fn host_time_duration_ops() {
        let t = HostTime(1000);
        assert_eq!((t + Duration(200)).ticks(), 1200);
        assert_eq!(HostTime(1200) - t, Duration(200));
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
        assert_eq!(t.saturating_duration_since(HostTime(400)), Duration(600));
        assert_eq!(HostTime(u64::MAX).saturating_add(Duration(1)), HostTime(u64::MAX));
    }

    #[test]
    #[should_panic(expected = "timebase denominator must not be zero")]
    fn zero_denominator_panics() {
        let _ = Timebase::new(1, 0);
    }
}
