// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native host clock selection and reads.
//!
//! Host ticks are nanoseconds for both sources. The monotonic source reads
//! `CLOCK_MONOTONIC` on Unix and a process-anchored
//! [`Instant`](std::time::Instant) elsewhere; the wall-clock source reads
//! [`SystemTime`] truncated to whole milliseconds since the Unix epoch.

use std::sync::OnceLock;
#[cfg(not(unix))]
use std::time::Instant;
#[cfg(unix)]
use std::time::Duration as StdDuration;
use std::time::{SystemTime, UNIX_EPOCH};

use kinematica_core::clock::{Clock, ClockSource, NonDecreasing};
use kinematica_core::time::{HostTime, Timebase};

#[cfg(unix)]
use rustix::time::{ClockId as PosixClockId, Timespec, clock_gettime};

const NANOS_PER_MILLI: u128 = 1_000_000;

static CLOCK_SOURCE: OnceLock<ClockSource> = OnceLock::new();

/// Returns the native [`Timebase`]: host ticks are nanoseconds.
#[must_use]
pub const fn timebase() -> Timebase {
    Timebase::NANOS
}

/// Returns the clock source selected for this process.
///
/// The probe runs on first call; later calls return the cached result.
/// Every supported native target exposes a monotonic clock, so this is
/// [`ClockSource::Monotonic`] in practice.
#[must_use]
pub fn clock_source() -> ClockSource {
    *CLOCK_SOURCE.get_or_init(|| ClockSource::select(is_available))
}

fn is_available(source: ClockSource) -> bool {
    match source {
        ClockSource::Monotonic => cfg!(any(unix, windows, target_os = "wasi")),
        ClockSource::WallClock => true,
    }
}

/// Returns the current host time from the selected clock source.
#[must_use]
pub fn now() -> HostTime {
    read(clock_source())
}

/// Returns a clock over the selected source whose reads never decrease.
#[must_use]
pub fn clock() -> NonDecreasing<HostClock> {
    NonDecreasing::new(HostClock::new(clock_source()))
}

/// A native [`Clock`] reading a fixed [`ClockSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostClock {
    source: ClockSource,
}

impl HostClock {
    /// Creates a clock reading `source`, bypassing the process-wide probe.
    #[must_use]
    pub const fn new(source: ClockSource) -> Self {
        Self { source }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new(clock_source())
    }
}

impl Clock for HostClock {
    fn now(&self) -> HostTime {
        read(self.source)
    }

    fn timebase(&self) -> Timebase {
        timebase()
    }

    fn source(&self) -> ClockSource {
        self.source
    }
}

fn read(source: ClockSource) -> HostTime {
    match source {
        ClockSource::Monotonic => monotonic_now(),
        ClockSource::WallClock => wall_clock_now(),
    }
}

#[cfg(unix)]
fn monotonic_now() -> HostTime {
    timespec_to_host_time(clock_gettime(PosixClockId::Monotonic))
}

#[cfg(not(unix))]
fn monotonic_now() -> HostTime {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    let anchor = *ANCHOR.get_or_init(Instant::now);
    HostTime(u64::try_from(anchor.elapsed().as_nanos()).unwrap_or(u64::MAX))
}

fn wall_clock_now() -> HostTime {
    // Before the epoch reads as zero.
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |since| since.as_millis());
    millis_to_host_time(millis)
}

fn millis_to_host_time(millis: u128) -> HostTime {
    let ticks = millis.saturating_mul(NANOS_PER_MILLI);
    HostTime(u64::try_from(ticks).unwrap_or(u64::MAX))
}

/// `CLOCK_MONOTONIC` never reports negative fields; if a host does, the
/// reading is treated as the clock's origin.
#[cfg(unix)]
fn timespec_to_host_time(reading: Timespec) -> HostTime {
    let secs = u64::try_from(reading.tv_sec);
    let subsec_nanos = u64::try_from(reading.tv_nsec);
    let (Ok(secs), Ok(subsec_nanos)) = (secs, subsec_nanos) else {
        return HostTime(0);
    };
    let since_origin = StdDuration::from_secs(secs).saturating_add(StdDuration::from_nanos(subsec_nanos));
    HostTime(u64::try_from(since_origin.as_nanos()).unwrap_or(u64::MAX))
}
