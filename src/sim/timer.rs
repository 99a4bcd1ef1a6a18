//! Timing primitives
//!
//! Two kinds of time exist in the simulation and must never be mixed:
//! - `TickCounter`: frame-counted, drives spawn cadence (frame-rate dependent)
//! - `Deadline`: wall-clock, drives modifier/hazard/narrative durations

use serde::{Deserialize, Serialize};

/// Wall-clock timestamp or span in milliseconds (host clock, e.g. `performance.now()`)
pub type Millis = f64;

/// Frame counter used for spawn cadence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCounter {
    ticks: u64,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self { ticks: 0 }
    }

    /// Advance by one frame
    #[inline]
    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    /// Frames counted since creation or last reset
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    /// True on frame 0 and every `interval` frames after it
    pub fn every(&self, interval: u64) -> bool {
        interval > 0 && self.ticks.is_multiple_of(interval)
    }

    /// True once at least `frames` frames have been counted
    pub fn reached(&self, frames: u64) -> bool {
        self.ticks >= frames
    }
}

/// Wall-clock expiry timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    at: Millis,
}

impl Deadline {
    pub const fn at(at: Millis) -> Self {
        Self { at }
    }

    /// Deadline `duration` ms after `now`
    pub fn after(now: Millis, duration: Millis) -> Self {
        Self { at: now + duration }
    }

    pub fn timestamp(&self) -> Millis {
        self.at
    }

    #[inline]
    pub fn expired(&self, now: Millis) -> bool {
        now >= self.at
    }

    /// Milliseconds left (never negative)
    pub fn remaining(&self, now: Millis) -> Millis {
        (self.at - now).max(0.0)
    }

    /// Move the deadline later (used to discount paused time)
    pub fn shift(&mut self, by: Millis) {
        self.at += by;
    }
}

/// Elapsed time since a recorded wall-clock start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stopwatch {
    started: Millis,
}

impl Stopwatch {
    pub const fn started_at(started: Millis) -> Self {
        Self { started }
    }

    pub fn started(&self) -> Millis {
        self.started
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        (now - self.started).max(0.0)
    }

    pub fn shift(&mut self, by: Millis) {
        self.started += by;
    }
}
