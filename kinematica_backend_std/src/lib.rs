// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native backend for kinematica.
//!
//! This crate provides the host half of the frame loop on native targets:
//!
//! - [`now`], [`clock`], [`HostClock`]: monotonic nanosecond clock (with a
//!   millisecond wall-clock fallback)
//! - [`TimerScheduler`]: fixed-delay frame timer at ~60 Hz
//! - [`animation_loop`]: an [`AnimationLoop`] wired to both
//!
//! Native hosts expose no display-refresh callback to `std`, so
//! [`frame_source`] always selects [`FrameSource::Timer`].
//!
//! ```no_run
//! use kinematica_backend_std::animation_loop;
//! use kinematica_core::animation::LoopControl;
//!
//! let anim = animation_loop(|frame| {
//!     if frame.time > 1000.0 { LoopControl::Stop } else { LoopControl::Continue }
//! });
//! anim.start();
//! anim.scheduler().run_until_idle();
//! ```

mod time;
mod timer;

use std::rc::Rc;
use std::sync::OnceLock;

use kinematica_core::animation::{AnimationLoop, Frame, LoopControl};
use kinematica_core::clock::NonDecreasing;
use kinematica_core::frame::FrameSource;

pub use time::{HostClock, clock, clock_source, now, timebase};
pub use timer::{TimerHandle, TimerScheduler};

/// Animation loop on the native clock and timer.
pub type HostAnimationLoop = AnimationLoop<Rc<TimerScheduler>, NonDecreasing<HostClock>>;

static FRAME_SOURCE: OnceLock<FrameSource> = OnceLock::new();

/// Returns the frame source selected for this process.
///
/// No native primitive is reachable, so the probe finds nothing and this is
/// always [`FrameSource::Timer`].
#[must_use]
pub fn frame_source() -> FrameSource {
    *FRAME_SOURCE.get_or_init(|| FrameSource::select(|_| false))
}

/// Creates a stopped animation loop on a fresh [`TimerScheduler`] and the
/// selected [`clock`].
///
/// Drive it by turning [`scheduler()`](AnimationLoop::scheduler).
pub fn animation_loop(callback: impl FnMut(&Frame) -> LoopControl + 'static) -> HostAnimationLoop {
    AnimationLoop::new(Rc::new(TimerScheduler::new()), clock(), callback)
}
