// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation loop over a [`FrameScheduler`] and a [`Clock`].
//!
//! [`AnimationLoop`] requests a frame, reads the clock when it arrives, hands
//! the callback a [`Frame`] and requests the next one, until stopped. Frame
//! timing follows the familiar canvas-library contract: `time` is the total
//! elapsed milliseconds since start, `time_diff` the milliseconds since the
//! previous frame, `last_time` the clock reading of this frame and
//! `frame_rate` the instantaneous rate.
//!
//! ```text
//!   start() ──► request_frame ──► (host turn) ──► FrameClock::advance
//!                    ▲                                   │
//!                    └──── LoopControl::Continue ◄── callback(&Frame)
//! ```

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};

use crate::clock::Clock;
use crate::frame::FrameScheduler;
use crate::time::{HostTime, Timebase};
use crate::trace::{
    FrameEvent, FrameRequestEvent, LoopStartEvent, LoopStopEvent, TraceSink, Tracer,
};

/// Timing for one delivered frame. All times are milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Zero-based index since the loop last started.
    pub frame_index: u64,
    /// Total elapsed time since start.
    pub time: f64,
    /// Time since the previous frame, or since start for the first frame.
    pub time_diff: f64,
    /// Clock reading for this frame.
    pub last_time: f64,
    /// `1000 / time_diff`, or `0.0` when `time_diff` is zero.
    pub frame_rate: f64,
}

/// Turns successive clock readings into [`Frame`]s.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    timebase: Timebase,
    last: HostTime,
    elapsed_ms: f64,
    next_index: u64,
}

impl FrameClock {
    /// Starts a frame clock at `start`.
    #[must_use]
    pub fn new(timebase: Timebase, start: HostTime) -> Self {
        Self {
            timebase,
            last: start,
            elapsed_ms: 0.0,
            next_index: 0,
        }
    }

    /// Produces the frame for a clock reading of `now`.
    ///
    /// A reading earlier than the previous one counts as zero elapsed time.
    pub fn advance(&mut self, now: HostTime) -> Frame {
        let time_diff = now
            .saturating_duration_since(self.last)
            .to_millis_f64(self.timebase);
        self.last = self.last.max(now);
        self.elapsed_ms += time_diff;

        let frame = Frame {
            frame_index: self.next_index,
            time: self.elapsed_ms,
            time_diff,
            last_time: self.last.to_millis_f64(self.timebase),
            frame_rate: if time_diff > 0.0 {
                1000.0 / time_diff
            } else {
                0.0
            },
        };
        self.next_index += 1;
        frame
    }
}

/// What the loop does after the callback returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopControl {
    /// Request the next frame.
    Continue,
    /// Stop the loop, as if [`AnimationLoop::stop`] had been called.
    Stop,
}

type LoopCallback = Box<dyn FnMut(&Frame) -> LoopControl>;

/// A start/stop animation loop.
///
/// Create with [`AnimationLoop::new`], then call [`start`](Self::start).
/// The loop re-requests a frame after every callback until
/// [`stop`](Self::stop) is called, the callback returns
/// [`LoopControl::Stop`], or the loop is dropped.
pub struct AnimationLoop<S: FrameScheduler + 'static, C: Clock + 'static> {
    inner: Rc<LoopInner<S, C>>,
}

struct LoopInner<S: FrameScheduler, C> {
    scheduler: S,
    clock: C,
    callback: RefCell<LoopCallback>,
    frame_clock: Cell<FrameClock>,
    running: Cell<bool>,
    /// Bumped on every start and stop. Callbacks from an earlier run carry
    /// a stale value and are ignored.
    generation: Cell<u64>,
    pending: RefCell<Option<S::Handle>>,
    frames_delivered: Cell<u64>,
    sink: RefCell<Option<Box<dyn TraceSink>>>,
}

impl<S: FrameScheduler + 'static, C: Clock + 'static> AnimationLoop<S, C> {
    /// Creates a loop that is **not yet running**.
    pub fn new(
        scheduler: S,
        clock: C,
        callback: impl FnMut(&Frame) -> LoopControl + 'static,
    ) -> Self {
        let frame_clock = FrameClock::new(clock.timebase(), HostTime(0));
        Self {
            inner: Rc::new(LoopInner {
                scheduler,
                clock,
                callback: RefCell::new(Box::new(callback)),
                frame_clock: Cell::new(frame_clock),
                running: Cell::new(false),
                generation: Cell::new(0),
                pending: RefCell::new(None),
                frames_delivered: Cell::new(0),
                sink: RefCell::new(None),
            }),
        }
    }

    /// Installs a sink for loop events. Events reach it only when the
    /// `trace` feature is enabled.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) {
        *self.inner.sink.borrow_mut() = Some(sink);
    }

    /// Starts the loop and requests the first frame.
    ///
    /// If already running, this is a no-op. Restarting resets frame timing.
    pub fn start(&self) {
        let inner = &self.inner;
        if inner.running.get() {
            return;
        }
        inner.running.set(true);
        inner.bump_generation();
        inner.frames_delivered.set(0);

        let started_at = inner.clock.now();
        let timebase = inner.clock.timebase();
        inner.frame_clock.set(FrameClock::new(timebase, started_at));

        let event = LoopStartEvent {
            clock: inner.clock.source(),
            frame_source: inner.scheduler.source(),
            timebase,
            started_at,
        };
        inner.with_tracer(|t| t.loop_start(&event));

        LoopInner::request_next(inner);
    }

    /// Stops the loop and cancels the pending frame request.
    ///
    /// If not running, this is a no-op.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Returns `true` if the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Frames delivered since the loop last started.
    #[must_use]
    pub fn frames_delivered(&self) -> u64 {
        self.inner.frames_delivered.get()
    }

    /// Returns the scheduler frames are requested through.
    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.inner.scheduler
    }

    /// Returns the clock frames are timed with.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.inner.clock
    }
}

impl<S: FrameScheduler, C: Clock> LoopInner<S, C> {
    fn bump_generation(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }

    fn with_tracer(&self, f: impl FnOnce(&mut Tracer<'_>)) {
        let mut guard = self.sink.borrow_mut();
        let sink: Option<&mut dyn TraceSink> = match guard.as_mut() {
            Some(sink) => Some(&mut **sink),
            None => None,
        };
        f(&mut Tracer::new(sink));
    }

    fn stop(&self) {
        if !self.running.get() {
            return;
        }
        self.running.set(false);
        self.bump_generation();

        let pending = self.pending.borrow_mut().take();
        if let Some(handle) = pending {
            self.scheduler.cancel_frame(handle);
        }

        let event = LoopStopEvent {
            stopped_at: self.clock.now(),
            frames_delivered: self.frames_delivered.get(),
        };
        self.with_tracer(|t| t.loop_stop(&event));
    }
}

impl<S: FrameScheduler + 'static, C: Clock + 'static> LoopInner<S, C> {
    fn request_next(this: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(this);
        let generation = this.generation.get();
        let handle = this.scheduler.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Self::on_frame(&inner, generation);
            }
        }));
        *this.pending.borrow_mut() = Some(handle);

        let event = FrameRequestEvent {
            frame_index: this.frames_delivered.get(),
            requested_at: this.clock.now(),
        };
        this.with_tracer(|t| t.frame_requested(&event));
    }

    fn on_frame(this: &Rc<Self>, generation: u64) {
        if !this.running.get() || this.generation.get() != generation {
            return;
        }
        // The request that brought us here has fired.
        this.pending.borrow_mut().take();

        let now = this.clock.now();
        let mut frame_clock = this.frame_clock.get();
        let frame = frame_clock.advance(now);
        this.frame_clock.set(frame_clock);
        this.frames_delivered.set(frame.frame_index + 1);

        let event = FrameEvent {
            frame_index: frame.frame_index,
            now,
            time_diff_ms: frame.time_diff,
            frame_rate: frame.frame_rate,
        };
        this.with_tracer(|t| t.frame(&event));

        let control = this.callback.borrow_mut()(&frame);
        // The callback may have stopped or restarted the loop; a restart
        // already requested its own first frame.
        if this.generation.get() != generation {
            return;
        }
        match control {
            LoopControl::Stop => this.stop(),
            LoopControl::Continue => Self::request_next(this),
        }
    }
}

impl<S: FrameScheduler + 'static, C: Clock + 'static> Drop for AnimationLoop<S, C> {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

impl<S: FrameScheduler + 'static, C: Clock + 'static> core::fmt::Debug for AnimationLoop<S, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnimationLoop")
            .field("running", &self.inner.running.get())
            .field("frames_delivered", &self.inner.frames_delivered.get())
            .field("frame_source", &self.inner.scheduler.source())
            .field("clock", &self.inner.clock.source())
            .finish_non_exhaustive()
    }
}
