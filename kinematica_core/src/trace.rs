// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for the animation loop.
//!
//! [`TraceSink`] has one method per loop event, each defaulting to a no-op,
//! so a sink only implements what it records.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. With the `trace`
//! feature **off**, every `Tracer` method compiles to nothing; with it **on**,
//! each method costs one `Option` branch.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies.

use crate::clock::ClockSource;
use crate::frame::FrameSource;
use crate::time::{HostTime, Timebase};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a loop starts, recording which sources it runs on.
#[derive(Clone, Copy, Debug)]
pub struct LoopStartEvent {
    /// Clock the loop reads frame times from.
    pub clock: ClockSource,
    /// Scheduler the loop requests frames through.
    pub frame_source: FrameSource,
    /// Timebase of every [`HostTime`] in subsequent events.
    pub timebase: Timebase,
    /// Clock reading at start.
    pub started_at: HostTime,
}

/// Emitted each time the loop asks its scheduler for a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameRequestEvent {
    /// Index of the frame being requested.
    pub frame_index: u64,
    /// Clock reading when the request was made.
    pub requested_at: HostTime,
}

/// Emitted when a frame is delivered, before the user callback runs.
#[derive(Clone, Copy, Debug)]
pub struct FrameEvent {
    /// Zero-based index of this frame since start.
    pub frame_index: u64,
    /// Clock reading for this frame.
    pub now: HostTime,
    /// Milliseconds since the previous frame (or since start).
    pub time_diff_ms: f64,
    /// Instantaneous frame rate, `1000 / time_diff_ms`.
    pub frame_rate: f64,
}

/// Emitted when a running loop stops.
#[derive(Clone, Copy, Debug)]
pub struct LoopStopEvent {
    /// Clock reading at stop.
    pub stopped_at: HostTime,
    /// Frames delivered during this run.
    pub frames_delivered: u64,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the animation loop.
pub trait TraceSink {
    /// Called when the loop starts.
    fn on_loop_start(&mut self, e: &LoopStartEvent) {
        _ = e;
    }

    /// Called when the loop requests a frame.
    fn on_frame_requested(&mut self, e: &FrameRequestEvent) {
        _ = e;
    }

    /// Called when a frame is delivered.
    fn on_frame(&mut self, e: &FrameEvent) {
        _ = e;
    }

    /// Called when the loop stops.
    fn on_loop_stop(&mut self, e: &LoopStopEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to `sink`, if any.
    #[inline]
    #[must_use]
    pub fn new(sink: Option<&'a mut dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::new(None)
    }

    /// Emits a [`LoopStartEvent`].
    #[inline]
    pub fn loop_start(&mut self, e: &LoopStartEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_loop_start(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameRequestEvent`].
    #[inline]
    pub fn frame_requested(&mut self, e: &FrameRequestEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_requested(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameEvent`].
    #[inline]
    pub fn frame(&mut self, e: &FrameEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LoopStopEvent`].
    #[inline]
    pub fn loop_stop(&mut self, e: &LoopStopEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_loop_stop(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> FrameEvent {
        FrameEvent {
            frame_index: 3,
            now: HostTime(50_000_000),
            time_diff_ms: 16.0,
            frame_rate: 62.5,
        }
    }

    #[test]
    fn noop_sink_accepts_every_event() {
        let mut sink = NoopSink;
        sink.on_loop_start(&LoopStartEvent {
            clock: ClockSource::Monotonic,
            frame_source: FrameSource::Timer,
            timebase: Timebase::NANOS,
            started_at: HostTime(0),
        });
        sink.on_frame(&sample_frame());
        sink.on_loop_stop(&LoopStopEvent {
            stopped_at: HostTime(1),
            frames_delivered: 0,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame(&sample_frame());
        tracer.frame_requested(&FrameRequestEvent {
            frame_index: 0,
            requested_at: HostTime(0),
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_frame(&mut self, e: &FrameEvent) {
                self.frames.push(e.frame_index);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(Some(&mut sink as &mut dyn TraceSink));
        tracer.frame(&sample_frame());
        drop(tracer);
        assert_eq!(sink.frames, &[3]);
    }
}
