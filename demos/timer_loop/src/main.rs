// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native frame loop that exercises clock and frame-source selection.
//!
//! Runs 30 frames on the fallback timer, tracing every event through a
//! [`PrettyPrintSink`](kinematica_debug::pretty::PrettyPrintSink), then prints
//! a pacing report and a sparkline of the last frame deltas.
//!
//! Pass `--json` to trace as JSON lines instead.

use std::cell::RefCell;
use std::rc::Rc;

use kinematica_backend_std::{animation_loop, clock_source, frame_source};
use kinematica_core::animation::LoopControl;
use kinematica_core::frame::FALLBACK_INTERVAL_MS;
use kinematica_core::trace::TraceSink;
use kinematica_debug::json::JsonLinesSink;
use kinematica_debug::pretty::PrettyPrintSink;
use kinematica_pacing_harness::{PacingReport, PacingSample, PacingTracker};

const FRAME_COUNT: u64 = 30;
const HISTORY: usize = 24;

fn main() {
    let json = std::env::args().any(|arg| arg == "--json");

    println!(
        "clock source: {}, frame source: {}",
        clock_source().as_str(),
        frame_source().as_str()
    );

    let tracker = Rc::new(RefCell::new(PacingTracker::<HISTORY>::default()));
    let report: Rc<RefCell<Option<PacingReport>>> = Rc::new(RefCell::new(None));

    let anim = {
        let tracker = Rc::clone(&tracker);
        let report = Rc::clone(&report);
        let source = frame_source();
        animation_loop(move |frame| {
            // The first delta runs from `start()`, not from a previous frame.
            if frame.frame_index > 0 {
                let latest = tracker
                    .borrow_mut()
                    .observe(PacingSample::from_frame(source, frame));
                *report.borrow_mut() = Some(latest);
            }
            if frame.frame_index + 1 >= FRAME_COUNT {
                LoopControl::Stop
            } else {
                LoopControl::Continue
            }
        })
    };

    let sink: Box<dyn TraceSink> = if json {
        Box::new(JsonLinesSink::new(std::io::stdout()))
    } else {
        Box::new(PrettyPrintSink::with_writer(std::io::stdout()))
    };
    anim.set_trace_sink(sink);

    anim.start();
    anim.scheduler().run_until_idle();

    let Some(report) = *report.borrow() else {
        println!("no frames observed");
        return;
    };
    println!(
        "grade {}: mean {:.3} ms, jitter {:.3} ms, {} of {} frames late",
        report.grade.as_str(),
        report.mean_delta_ms,
        report.jitter_ms,
        report.late_frames,
        report.total_frames,
    );
    println!(
        "[{}]",
        tracker
            .borrow()
            .sparkline_ascii(FALLBACK_INTERVAL_MS * 0.5, FALLBACK_INTERVAL_MS * 2.0)
    );
}
