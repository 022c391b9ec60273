// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON-lines trace output.
//!
//! [`JsonLinesSink`] writes one JSON object per event, newline separated, so
//! a run can be piped into `jq` or loaded line by line. Every object has an
//! `"event"` key; host times are emitted as milliseconds (`"*_ms"`).

use std::io::Write;

use serde_json::{Value, json};

use kinematica_core::time::{HostTime, Timebase};
use kinematica_core::trace::{
    FrameEvent, FrameRequestEvent, LoopStartEvent, LoopStopEvent, TraceSink,
};

/// Writes one JSON object per trace event.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink that writes to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
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

    fn emit(&mut self, value: &Value) {
        if serde_json::to_writer(&mut self.writer, value).is_ok() {
            let _ = self.writer.write_all(b"\n");
        }
    }
}

impl<W: Write> TraceSink for JsonLinesSink<W> {
    fn on_loop_start(&mut self, e: &LoopStartEvent) {
        self.timebase = e.timebase;
        let value = json!({
            "event": "loop_start",
            "clock": e.clock.as_str(),
            "frame_source": e.frame_source.as_str(),
            "vsync": e.frame_source.is_vsync_aligned(),
            "started_at_ms": self.ms(e.started_at),
        });
        self.emit(&value);
    }

    fn on_frame_requested(&mut self, e: &FrameRequestEvent) {
        let value = json!({
            "event": "frame_requested",
            "frame_index": e.frame_index,
            "requested_at_ms": self.ms(e.requested_at),
        });
        self.emit(&value);
    }

    fn on_frame(&mut self, e: &FrameEvent) {
        let value = json!({
            "event": "frame",
            "frame_index": e.frame_index,
            "now_ms": self.ms(e.now),
            "time_diff_ms": e.time_diff_ms,
            "frame_rate": e.frame_rate,
        });
        self.emit(&value);
    }

    fn on_loop_stop(&mut self, e: &LoopStopEvent) {
        let value = json!({
            "event": "loop_stop",
            "frames_delivered": e.frames_delivered,
            "stopped_at_ms": self.ms(e.stopped_at),
        });
        self.emit(&value);
    }
}
