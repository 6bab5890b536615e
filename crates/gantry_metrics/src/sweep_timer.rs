//! Sweep timing utilities

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

/// Rolling timer over the most recent sweeps of an ECS loop.
pub struct SweepTimer {
    sweep_start: Instant,
    sweep_times: RingBuffer<Duration>,
}

impl SweepTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            sweep_start: Instant::now(),
            sweep_times: RingBuffer::new(capacity),
        }
    }

    pub fn begin(&mut self) {
        self.sweep_start = Instant::now();
    }

    pub fn end(&mut self) {
        let elapsed = self.sweep_start.elapsed();
        self.sweep_times.push(elapsed);
    }

    /// Number of sweeps currently held in the rolling window.
    pub fn samples(&self) -> usize {
        self.sweep_times.len()
    }

    pub fn sweeps_per_second(&self) -> f64 {
        let avg = self.sweep_times.average();
        if avg.as_secs_f64() > 0.0 {
            1.0 / avg.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn sweep_time_ms(&self) -> f64 {
        self.sweep_times.average().as_secs_f64() * 1000.0
    }

    pub fn sweep_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.sweep_times.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_one_sample_per_sweep() {
        let mut timer = SweepTimer::new(4);
        for _ in 0..6 {
            timer.begin();
            timer.end();
        }
        assert_eq!(timer.samples(), 4);

        let (min, max) = timer.sweep_time_range_ms();
        assert!(min <= max);
    }
}
