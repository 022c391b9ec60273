// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame pacing metrics and grading.
//!
//! Feed each delivered frame's `time_diff` into a [`PacingTracker`] to see
//! whether a scheduler holds its cadence: mean interval, worst deviation
//! from the target, late-frame rate and a letter grade.

#![no_std]

extern crate alloc;

use alloc::string::String;
use kinematica_core::animation::Frame;
use kinematica_core::frame::{FALLBACK_INTERVAL_MS, FrameSource};

/// A frame counts as late when its delta exceeds the target by this factor.
pub const LATE_FACTOR: f64 = 1.5;

/// Per-frame input to [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct PacingSample {
    /// Source the frame was scheduled through.
    pub source: FrameSource,
    /// Milliseconds since the previous frame.
    pub frame_delta_ms: f64,
}

impl PacingSample {
    /// Builds a sample from a delivered [`Frame`].
    #[must_use]
    pub const fn from_frame(source: FrameSource, frame: &Frame) -> Self {
        Self {
            source,
            frame_delta_ms: frame.time_diff,
        }
    }
}

/// Letter grade for pacing quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacingGrade {
    /// Steady cadence, almost no late frames.
    A,
    /// Minor jitter or occasional late frames.
    B,
    /// Noticeable jitter.
    C,
    /// Poor pacing.
    D,
}

impl PacingGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct PacingReport {
    /// Current grade.
    pub grade: PacingGrade,
    /// Mean delta over the ring buffer, in ms.
    pub mean_delta_ms: f64,
    /// Largest absolute deviation from the target over the ring buffer, in ms.
    pub jitter_ms: f64,
    /// Late frames per 1000 observed frames.
    pub late_per_1000: f64,
    /// Total frames observed.
    pub total_frames: u64,
    /// Total late frames observed.
    pub late_frames: u64,
}

/// Rolling pacing tracker with a fixed-size frame-delta history.
#[derive(Debug)]
pub struct PacingTracker<const N: usize> {
    deltas_ms: [f64; N],
    cursor: usize,
    target_ms: f64,
    total_frames: u64,
    late_frames: u64,
}

impl<const N: usize> Default for PacingTracker<N> {
    fn default() -> Self {
        Self::new(FALLBACK_INTERVAL_MS)
    }
}

impl<const N: usize> PacingTracker<N> {
    /// Creates a tracker targeting `target_ms` per frame, with the ring
    /// buffer prefilled with the target.
    #[must_use]
    pub const fn new(target_ms: f64) -> Self {
        Self {
            deltas_ms: [target_ms; N],
            cursor: 0,
            target_ms,
            total_frames: 0,
            late_frames: 0,
        }
    }

    /// Observes one frame and returns an updated report.
    pub fn observe(&mut self, sample: PacingSample) -> PacingReport {
        self.total_frames = self.total_frames.saturating_add(1);
        if N > 0 {
            self.deltas_ms[self.cursor % N] = sample.frame_delta_ms;
            self.cursor = (self.cursor + 1) % N;
        }

        if sample.frame_delta_ms > self.target_ms * LATE_FACTOR {
            self.late_frames = self.late_frames.saturating_add(1);
        }

        let late_rate = self.late_frames as f64 * 1000.0 / self.total_frames as f64;
        let jitter = self.jitter_ms();

        PacingReport {
            grade: grade_for(sample.source, jitter, late_rate),
            mean_delta_ms: self.mean_delta_ms(),
            jitter_ms: jitter,
            late_per_1000: late_rate,
            total_frames: self.total_frames,
            late_frames: self.late_frames,
        }
    }

    /// Mean of the ring buffer, in ms.
    #[must_use]
    pub fn mean_delta_ms(&self) -> f64 {
        if N == 0 {
            return self.target_ms;
        }
        self.deltas_ms.iter().sum::<f64>() / N as f64
    }

    /// Largest absolute deviation from the target in the ring buffer, in ms.
    #[must_use]
    pub fn jitter_ms(&self) -> f64 {
        self.deltas_ms
            .iter()
            .map(|d| (d - self.target_ms).abs())
            .fold(0.0, f64::max)
    }

    /// Returns ring-buffer frame deltas oldest to newest.
    #[must_use]
    pub fn frame_deltas(&self) -> [f64; N] {
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.deltas_ms[(self.cursor + i) % N];
        }
        out
    }

    /// Returns an ASCII sparkline over [`frame_deltas`](Self::frame_deltas).
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let span = (max_ms - min_ms).max(f64::EPSILON);
        self.frame_deltas()
            .iter()
            .map(|&delta| {
                let t = (delta.clamp(min_ms, max_ms) - min_ms) / span;
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "t is clamped to [0, 1], so the index is within LEVELS"
                )]
                let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
                LEVELS[level.min(LEVELS.len() - 1)] as char
            })
            .collect()
    }
}

fn grade_for(source: FrameSource, jitter_ms: f64, late_per_1000: f64) -> PacingGrade {
    // Timers drift more than vsync callbacks, so they get looser thresholds.
    let (a_jitter, b_jitter, c_jitter, a_late, b_late, c_late) = if source.is_vsync_aligned() {
        (2.0, 5.0, 10.0, 5.0, 20.0, 60.0)
    } else {
        (4.0, 8.0, 16.0, 10.0, 40.0, 100.0)
    };

    if jitter_ms < a_jitter && late_per_1000 < a_late {
        PacingGrade::A
    } else if jitter_ms < b_jitter && late_per_1000 < b_late {
        PacingGrade::B
    } else if jitter_ms < c_jitter && late_per_1000 < c_late {
        PacingGrade::C
    } else {
        PacingGrade::D
    }
}
