// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame source selection and the [`FrameScheduler`] trait.
//!
//! A frame scheduler arranges for a callback to run once, as close to the
//! next display refresh as the host allows. Browsers expose this as
//! `requestAnimationFrame`, historically behind vendor prefixes. When no such
//! primitive exists the backend falls back to a fixed-delay timer at
//! [`FALLBACK_FRAME_RATE`].
//!
//! Selection is a one-time probe over [`FrameSource::PROBE_ORDER`]; the
//! backend keeps the winner and routes every request through it.

use alloc::boxed::Box;
use alloc::rc::Rc;

use crate::time::{Duration, Timebase};

/// Target rate of the fixed-delay fallback timer, in frames per second.
pub const FALLBACK_FRAME_RATE: u32 = 60;

/// Delay of the fallback timer in milliseconds (`1000 / 60`).
pub const FALLBACK_INTERVAL_MS: f64 = 1000.0 / FALLBACK_FRAME_RATE as f64;

const FALLBACK_INTERVAL_NANOS: u64 = 1_000_000_000 / FALLBACK_FRAME_RATE as u64;

/// Returns the fallback timer delay (~16.67 ms) in `timebase` ticks.
#[must_use]
pub const fn fallback_interval(timebase: Timebase) -> Duration {
    Duration::from_nanos(FALLBACK_INTERVAL_NANOS, timebase)
}

/// Which frame-scheduling function a backend selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameSource {
    /// `requestAnimationFrame`.
    Standard,
    /// `webkitRequestAnimationFrame`.
    Webkit,
    /// `mozRequestAnimationFrame`.
    Moz,
    /// `oRequestAnimationFrame`.
    Opera,
    /// `msRequestAnimationFrame`.
    Ms,
    /// Fixed-delay timer at [`FALLBACK_FRAME_RATE`].
    Timer,
}

impl FrameSource {
    /// Native sources in probe order: unprefixed first, then vendor variants.
    pub const PROBE_ORDER: [Self; 5] = [
        Self::Standard,
        Self::Webkit,
        Self::Moz,
        Self::Opera,
        Self::Ms,
    ];

    /// Returns the first native source for which `is_available` holds, or
    /// [`Timer`](Self::Timer) if none does.
    ///
    /// Probing stops at the first hit.
    #[must_use]
    pub fn select(mut is_available: impl FnMut(Self) -> bool) -> Self {
        Self::PROBE_ORDER
            .into_iter()
            .find(|&source| is_available(source))
            .unwrap_or(Self::Timer)
    }

    /// Host global that requests a frame, or `None` for the timer.
    #[must_use]
    pub const fn request_name(self) -> Option<&'static str> {
        match self {
            Self::Standard => Some("requestAnimationFrame"),
            Self::Webkit => Some("webkitRequestAnimationFrame"),
            Self::Moz => Some("mozRequestAnimationFrame"),
            Self::Opera => Some("oRequestAnimationFrame"),
            Self::Ms => Some("msRequestAnimationFrame"),
            Self::Timer => None,
        }
    }

    /// Host global that cancels a pending frame request, or `None` for the
    /// timer.
    #[must_use]
    pub const fn cancel_name(self) -> Option<&'static str> {
        match self {
            Self::Standard => Some("cancelAnimationFrame"),
            Self::Webkit => Some("webkitCancelAnimationFrame"),
            Self::Moz => Some("mozCancelAnimationFrame"),
            Self::Opera => Some("oCancelAnimationFrame"),
            Self::Ms => Some("msCancelAnimationFrame"),
            Self::Timer => None,
        }
    }

    /// Returns `true` if callbacks are aligned with the display refresh.
    #[must_use]
    pub const fn is_vsync_aligned(self) -> bool {
        !matches!(self, Self::Timer)
    }

    /// Short label for diagnostics: the host global name, or `"timer"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self.request_name() {
            Some(name) => name,
            None => "timer",
        }
    }
}

/// A one-shot callback handed to a [`FrameScheduler`].
pub type FrameCallback = Box<dyn FnOnce()>;

/// Schedules one-shot callbacks near the next display refresh.
///
/// Implementations must never run `callback` synchronously inside
/// [`request_frame`](Self::request_frame); it runs on a later turn of the
/// host event loop, exactly once unless cancelled.
pub trait FrameScheduler {
    /// Identifies a pending request for [`cancel_frame`](Self::cancel_frame).
    type Handle;

    /// Returns which source this scheduler routes requests through.
    fn source(&self) -> FrameSource;

    /// Arranges for `callback` to run once on a future frame.
    fn request_frame(&self, callback: FrameCallback) -> Self::Handle;

    /// Cancels a pending request.
    ///
    /// Cancelling a request that already fired is a no-op.
    fn cancel_frame(&self, handle: Self::Handle);
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for &S {
    type Handle = S::Handle;

    fn source(&self) -> FrameSource {
        (**self).source()
    }

    fn request_frame(&self, callback: FrameCallback) -> Self::Handle {
        (**self).request_frame(callback)
    }

    fn cancel_frame(&self, handle: Self::Handle) {
        (**self).cancel_frame(handle);
    }
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for Rc<S> {
    type Handle = S::Handle;

    fn source(&self) -> FrameSource {
        (**self).source()
    }

    fn request_frame(&self, callback: FrameCallback) -> Self::Handle {
        (**self).request_frame(callback)
    }

    fn cancel_frame(&self, handle: Self::Handle) {
        (**self).cancel_frame(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn unprefixed_wins_when_everything_is_available() {
        assert_eq!(FrameSource::select(|_| true), FrameSource::Standard);
    }

    #[test]
    fn vendor_variants_follow_probe_order() {
        let source = FrameSource::select(|s| matches!(s, FrameSource::Moz | FrameSource::Ms));
        assert_eq!(source, FrameSource::Moz);

        let source = FrameSource::select(|s| s == FrameSource::Ms);
        assert_eq!(source, FrameSource::Ms);
    }

    #[test]
    fn probing_stops_at_first_hit() {
        let mut probed = Vec::new();
        let source = FrameSource::select(|s| {
            probed.push(s);
            s == FrameSource::Webkit
        });
        assert_eq!(source, FrameSource::Webkit);
        assert_eq!(probed, [FrameSource::Standard, FrameSource::Webkit]);
    }

    #[test]
    fn nothing_available_falls_back_to_timer() {
        let source = FrameSource::select(|_| false);
        assert_eq!(source, FrameSource::Timer);
        assert!(!source.is_vsync_aligned());
        assert_eq!(source.request_name(), None);
        assert_eq!(source.cancel_name(), None);
    }

    #[test]
    fn native_sources_have_paired_host_names() {
        for source in FrameSource::PROBE_ORDER {
            let request = source.request_name().unwrap();
            let cancel = source.cancel_name().unwrap();
            assert!(request.ends_with("equestAnimationFrame"), "{request}");
            assert!(cancel.ends_with("ancelAnimationFrame"), "{cancel}");
            assert!(source.is_vsync_aligned());
            assert_eq!(source.as_str(), request);
        }
    }

    #[test]
    fn fallback_interval_is_sixty_hertz() {
        assert_eq!(fallback_interval(Timebase::NANOS), Duration(16_666_666));
        assert_eq!(fallback_interval(Timebase::MICROS), Duration(16_666));
        assert!((FALLBACK_INTERVAL_MS - 16.666_666).abs() < 1e-3);
    }
}
