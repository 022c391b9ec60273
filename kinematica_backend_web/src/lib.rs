// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for kinematica.
//!
//! This crate provides integration with browser timing APIs:
//!
//! - [`now`], [`clock()`], [`WebClock`]: `performance.now()` with a
//!   `Date.now()` fallback
//! - [`RafScheduler`]: `requestAnimationFrame` (or a vendor variant) with a
//!   `setTimeout` fallback at ~60 Hz
//! - [`animation_loop`]: an [`AnimationLoop`] wired to both
//!
//! Both probes run once per thread on first use. Cancelling a pending frame
//! of a host without a cancel function is left to the loop, which ignores
//! stale callbacks.

mod clock;
mod raf;

use std::rc::Rc;

use kinematica_core::animation::{AnimationLoop, Frame, LoopControl};
use kinematica_core::clock::NonDecreasing;

pub use clock::{WebClock, clock, clock_source, now, timebase};
pub use raf::{RafHandle, RafScheduler, frame_source};

/// Animation loop on the browser clock and frame scheduler.
pub type WebAnimationLoop = AnimationLoop<Rc<RafScheduler>, NonDecreasing<WebClock>>;

/// Creates a stopped animation loop on a fresh [`RafScheduler`] and the
/// selected [`clock()`].
pub fn animation_loop(callback: impl FnMut(&Frame) -> LoopControl + 'static) -> WebAnimationLoop {
    AnimationLoop::new(Rc::new(RafScheduler::new()), clock(), callback)
}
