// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace sinks for kinematica diagnostics.
//!
//! This crate provides [`TraceSink`](kinematica_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`json::JsonLinesSink`] — one JSON object per event, for tooling.

pub mod json;
pub mod pretty;
