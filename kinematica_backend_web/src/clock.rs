// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser clock selection.
//!
//! `performance.now()` is preferred; hosts without it fall back to
//! `Date.now()`. The probe runs once per thread on first use. A read of
//! `performance.now()` that throws or returns a non-number falls back to
//! `Date.now()` for that read, shifted onto the `performance.now()` scale by
//! the offset measured at probe time. Both readers return fractional
//! milliseconds, which are stored as microsecond [`HostTime`] ticks.

use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Performance;

use kinematica_core::clock::{Clock, ClockSource, NonDecreasing};
use kinematica_core::time::{HostTime, Timebase};

enum Reader {
    Performance {
        performance: Performance,
        now: Function,
        /// `Date.now() - performance.now()` at probe time.
        date_offset_ms: f64,
    },
    Date,
}

impl Reader {
    fn probe() -> Self {
        let found = performance_with_now().and_then(|(performance, now)| {
            let first = now.call0(&performance).ok()?.as_f64()?;
            first
                .is_finite()
                .then(|| (performance, now, js_sys::Date::now() - first))
        });
        match (ClockSource::select(|_| found.is_some()), found) {
            (ClockSource::Monotonic, Some((performance, now, date_offset_ms))) => {
                Self::Performance {
                    performance,
                    now,
                    date_offset_ms,
                }
            }
            _ => Self::Date,
        }
    }

    fn source(&self) -> ClockSource {
        match self {
            Self::Performance { .. } => ClockSource::Monotonic,
            Self::Date => ClockSource::WallClock,
        }
    }

    fn now_millis(&self) -> f64 {
        match self {
            Self::Performance {
                performance,
                now,
                date_offset_ms,
            } => {
                let reading = now.call0(performance).map(|value| value.as_f64());
                reading_or_else(reading, || js_sys::Date::now() - date_offset_ms)
            }
            Self::Date => js_sys::Date::now(),
        }
    }
}

std::thread_local! {
    static READER: Reader = Reader::probe();
}

/// Returns the global `performance` object and its `now` function, if
/// callable.
fn performance_with_now() -> Option<(Performance, Function)> {
    let performance = Reflect::get(&js_sys::global(), &JsValue::from_str("performance")).ok()?;
    if !performance.is_object() {
        return None;
    }
    let now = Reflect::get(&performance, &JsValue::from_str("now"))
        .ok()?
        .dyn_into::<Function>()
        .ok()?;
    Some((performance.unchecked_into::<Performance>(), now))
}

/// Uses `reading` when it is a finite number of milliseconds, otherwise
/// reads `fallback`.
fn reading_or_else<E>(reading: Result<Option<f64>, E>, fallback: impl FnOnce() -> f64) -> f64 {
    match reading {
        Ok(Some(millis)) if millis.is_finite() => millis,
        _ => fallback(),
    }
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub const fn timebase() -> Timebase {
    Timebase::MICROS
}

/// Returns the clock source selected for this thread.
#[must_use]
pub fn clock_source() -> ClockSource {
    READER.with(Reader::source)
}

/// Returns the current host time from the selected reader, in microsecond
/// ticks.
#[must_use]
pub fn now() -> HostTime {
    READER.with(|reader| millis_to_host_time(reader.now_millis()))
}

/// Returns a clock over the selected reader whose reads never decrease.
#[must_use]
pub fn clock() -> NonDecreasing<WebClock> {
    NonDecreasing::new(WebClock)
}

/// A [`Clock`] over the selected browser reader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WebClock;

impl Clock for WebClock {
    fn now(&self) -> HostTime {
        now()
    }

    fn timebase(&self) -> Timebase {
        timebase()
    }

    fn source(&self) -> ClockSource {
        clock_source()
    }
}

/// Converts a `DOMHighResTimeStamp` or `Date.now()` value to µs ticks.
fn millis_to_host_time(millis: f64) -> HostTime {
    HostTime::from_millis_f64(millis, timebase())
}
