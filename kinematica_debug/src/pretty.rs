// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times
//! are printed in milliseconds using the timebase announced by the loop's
//! start event.

use std::io::Write;

use kinematica_core::time::{HostTime, Timebase};
use kinematica_core::trace::{
    FrameEvent, FrameRequestEvent, LoopStartEvent, LoopStopEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    ///
    /// Times print as nanosecond ticks until a loop start event announces
    /// the real timebase.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            timebase: Timebase::NANOS,
        }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ms(&self, t: HostTime) -> f64 {
        t.to_millis_f64(self.timebase)
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_loop_start(&mut self, e: &LoopStartEvent) {
        self.timebase = e.timebase;
        let _ = writeln!(
            self.writer,
            "[start] clock={} frames={} at={:.3}ms",
            e.clock.as_str(),
            e.frame_source.as_str(),
            self.ms(e.started_at),
        );
    }

    fn on_frame_requested(&mut self, e: &FrameRequestEvent) {
        let _ = writeln!(
            self.writer,
            "[request] frame={} at={:.3}ms",
            e.frame_index,
            self.ms(e.requested_at),
        );
    }

    fn on_frame(&mut self, e: &FrameEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} dt={:.3}ms fps={:.1} at={:.3}ms",
            e.frame_index,
            e.time_diff_ms,
            e.frame_rate,
            self.ms(e.now),
        );
    }

    fn on_loop_stop(&mut self, e: &LoopStopEvent) {
        let _ = writeln!(
            self.writer,
            "[stop] frames={} at={:.3}ms",
            e.frames_delivered,
            self.ms(e.stopped_at),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinematica_core::clock::ClockSource;
    use kinematica_core::frame::FrameSource;

    #[test]
    fn start_line_names_both_sources() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_loop_start(&LoopStartEvent {
            clock: ClockSource::Monotonic,
            frame_source: FrameSource::Webkit,
            timebase: Timebase::MICROS,
            started_at: HostTime(2_500),
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("[start]"), "got: {output}");
        assert!(output.contains("clock=monotonic"), "got: {output}");
        assert!(output.contains("frames=webkitRequestAnimationFrame"), "got: {output}");
        assert!(output.contains("at=2.500ms"), "got: {output}");
    }

    #[test]
    fn frame_line_uses_announced_timebase() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_loop_start(&LoopStartEvent {
            clock: ClockSource::Monotonic,
            frame_source: FrameSource::Timer,
            timebase: Timebase::MICROS,
            started_at: HostTime(0),
        });
        sink.on_frame(&FrameEvent {
            frame_index: 1,
            now: HostTime(33_000),
            time_diff_ms: 16.5,
            frame_rate: 60.606,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let line = output.lines().nth(1).unwrap();
        assert_eq!(line, "[frame] frame=1 dt=16.500ms fps=60.6 at=33.000ms");
    }
}
