//! Gantry Metrics - sweep timing for the ECS loop
//!
//! Instrumentation that completely vanishes in production builds via
//! feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use gantry_metrics::SweepTimer;
//!
//! let mut timer = SweepTimer::new(120); // Track last 120 sweeps
//! timer.begin();
//! // ... sweep ...
//! timer.end();
//! println!("sweeps/s: {:.1}", timer.sweeps_per_second());
//! ```
//!
//! Without the `metrics` feature every type below is a zero-sized stub.

#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod sweep_timer;

#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use sweep_timer::SweepTimer;

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct SweepTimer;

#[cfg(not(feature = "metrics"))]
impl SweepTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn samples(&self) -> usize { 0 }
    pub fn sweeps_per_second(&self) -> f64 { 0.0 }
    pub fn sweep_time_ms(&self) -> f64 { 0.0 }
    pub fn sweep_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}
