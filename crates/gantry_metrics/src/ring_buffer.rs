//! Fixed-capacity ring buffer for rolling statistics

use std::time::Duration;

pub struct RingBuffer<T> {
    samples: Vec<T>,
    capacity: usize,
    index: usize,
}

impl<T> RingBuffer<T> {
    /// `capacity` is clamped to at least one sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            index: 0,
        }
    }

    /// Push a sample, overwriting the oldest once full.
    pub fn push(&mut self, sample: T) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.index] = sample;
        }
        self.index = (self.index + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.index = 0;
    }
}

impl RingBuffer<Duration> {
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }

    pub fn min_max(&self) -> (Duration, Duration) {
        let mut samples = self.samples.iter().copied();
        let Some(first) = samples.next() else {
            return (Duration::ZERO, Duration::ZERO);
        };

        samples.fold((first, first), |(min, max), sample| {
            (min.min(sample), max.max(sample))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_rolls_over_capacity() {
        let mut buffer = RingBuffer::new(3);

        buffer.push(Duration::from_millis(10));
        assert_eq!(buffer.average(), Duration::from_millis(10));

        buffer.push(Duration::from_millis(20));
        buffer.push(Duration::from_millis(30));
        assert_eq!(buffer.average(), Duration::from_millis(20));

        // Oldest sample (10ms) is overwritten
        buffer.push(Duration::from_millis(40));
        assert_eq!(buffer.average(), Duration::from_millis(30));
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn min_max_of_empty_buffer_is_zero() {
        let buffer: RingBuffer<Duration> = RingBuffer::new(4);
        assert_eq!(buffer.min_max(), (Duration::ZERO, Duration::ZERO));
    }

    #[test]
    fn min_max_tracks_extremes() {
        let mut buffer = RingBuffer::new(4);
        buffer.push(Duration::from_millis(7));
        buffer.push(Duration::from_millis(2));
        buffer.push(Duration::from_millis(9));
        assert_eq!(
            buffer.min_max(),
            (Duration::from_millis(2), Duration::from_millis(9))
        );
    }

    #[test]
    fn clear_restarts_the_window() {
        let mut buffer = RingBuffer::new(2);
        buffer.push(Duration::from_millis(5));
        buffer.push(Duration::from_millis(6));
        buffer.clear();
        assert!(buffer.is_empty());

        buffer.push(Duration::from_millis(8));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.average(), Duration::from_millis(8));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut buffer = RingBuffer::new(0);
        buffer.push(Duration::from_millis(1));
        buffer.push(Duration::from_millis(3));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.average(), Duration::from_millis(3));
    }
}
