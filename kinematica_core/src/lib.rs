// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clock selection, frame scheduling and animation-loop timing.
//!
//! `kinematica_core` holds the host-independent half of the frame loop. It is
//! `no_std` compatible (with `alloc`); backend crates supply the host half by
//! probing what the platform offers and implementing the traits defined
//! here.
//!
//! # Architecture
//!
//! ```text
//!   Backend probe (once)                      Backend probe (once)
//!   ClockSource::select()                     FrameSource::select()
//!        │                                          │
//!        ▼                                          ▼
//!     impl Clock ──────────┐          ┌────── impl FrameScheduler
//!                          ▼          ▼
//!                        AnimationLoop::start()
//!                                 │
//!                                 ▼
//!                     Frame ──► callback ──► LoopControl
//! ```
//!
//! **[`time`]** — Tick-based [`HostTime`](time::HostTime) and
//! [`Duration`](time::Duration) with [`Timebase`](time::Timebase)
//! conversion to nanoseconds and fractional milliseconds.
//!
//! **[`clock`]** — [`ClockSource`](clock::ClockSource) preference order
//! (monotonic, then wall clock) and the [`Clock`](clock::Clock) trait.
//!
//! **[`frame`]** — [`FrameSource`](frame::FrameSource) probe order
//! (`requestAnimationFrame`, vendor variants, then a 60 Hz timer) and the
//! [`FrameScheduler`](frame::FrameScheduler) trait.
//!
//! **[`animation`]** — [`AnimationLoop`](animation::AnimationLoop) and the
//! per-frame [`Frame`](animation::Frame) timing it reports.
//!
//! **[`manual`]** — Deterministic clock and scheduler for stepping frames
//! without a host.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and the
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animation;
pub mod clock;
pub mod frame;
pub mod manual;
pub mod time;
pub mod trace;
