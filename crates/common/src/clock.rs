//! Frame timing utilities for export progress.
//!
//! The export loop measures how long each frame takes to render and
//! hand off, and derives a time-remaining estimate from a moving
//! average over the most recent frames.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default number of frames in the moving-average window.
pub const DEFAULT_FRAME_WINDOW: usize = 30;

/// Number of frames needed to cover `duration_secs` at `fps`.
///
/// Always `ceil(duration * fps)`; non-positive or non-finite durations
/// yield zero frames.
pub fn total_frames(duration_secs: f64, fps: u32) -> u64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || fps == 0 {
        return 0;
    }
    (duration_secs * fps as f64).ceil() as u64
}

/// Timestamp in seconds of frame `index` at `fps`.
pub fn frame_time_secs(index: u64, fps: u32) -> f64 {
    index as f64 / fps.max(1) as f64
}

/// Moving-average frame timer.
#[derive(Debug)]
pub struct FrameTimer {
    window: usize,
    samples: VecDeque<Duration>,
    sum: Duration,
    frame_started: Option<Instant>,
    started: Instant,
}

impl FrameTimer {
    /// Create a timer averaging over the last `window` frames.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
            sum: Duration::ZERO,
            frame_started: None,
            started: Instant::now(),
        }
    }

    /// Mark the beginning of a frame.
    pub fn begin_frame(&mut self) {
        self.frame_started = Some(Instant::now());
    }

    /// Mark the end of the current frame and record its duration.
    ///
    /// Does nothing if `begin_frame` was not called.
    pub fn end_frame(&mut self) {
        if let Some(started) = self.frame_started.take() {
            self.record(started.elapsed());
        }
    }

    /// Record an externally measured frame duration.
    pub fn record(&mut self, sample: Duration) {
        if self.samples.len() == self.window {
            if let Some(oldest) = self.samples.pop_front() {
                self.sum -= oldest;
            }
        }
        self.samples.push_back(sample);
        self.sum += sample;
    }

    /// Average frame duration in seconds over the window (0 when empty).
    pub fn average_secs(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.sum.as_secs_f64() / self.samples.len() as f64
    }

    /// Estimated seconds to finish `remaining_frames` more frames.
    pub fn eta_secs(&self, remaining_frames: u64) -> f64 {
        self.average_secs() * remaining_frames as f64
    }

    /// Number of samples currently in the window.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Wall time since the timer was created.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_WINDOW)
    }
}
