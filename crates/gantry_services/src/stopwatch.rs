//! Timekeeping service

use std::time::{Duration, Instant};

/// Pausable millisecond stopwatch. Starts running on construction.
#[derive(Debug)]
pub struct Stopwatch {
    reset_at: Instant,
    active: bool,
}

gantry_core::define_service!(Stopwatch);

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            reset_at: Instant::now(),
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Elapsed time since the last start or reset; zero while paused.
    pub fn elapsed(&self) -> Duration {
        if self.active {
            self.reset_at.elapsed()
        } else {
            Duration::ZERO
        }
    }

    pub fn milliseconds(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Whole seconds, rounded down.
    pub fn seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }

    /// Restart the count. Returns the milliseconds elapsed before the reset.
    pub fn reset(&mut self) -> u64 {
        if !self.active {
            return 0;
        }
        let elapsed = self.milliseconds();
        self.reset_at = Instant::now();
        elapsed
    }

    /// Pause or resume. Resuming restarts the count from zero.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        if self.active {
            self.reset_at = Instant::now();
        }
        self.active
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
