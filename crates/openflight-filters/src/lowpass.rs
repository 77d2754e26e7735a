//! Exponential low-pass filter with a time-varying smoothing factor.

use crate::STALL_RESET;
use openflight_dispenser::Destroyable;
use std::time::Instant;

/// First-order low-pass over an irregular sample stream.
///
/// The smoothing factor is recomputed from the wall-clock delta on every
/// update: `alpha = dt / (1/cutoff + dt)`, so the corner frequency stays put
/// regardless of the caller's frame rate.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    cutoff_hz: f32,
    value: f32,
    last_update: Option<Instant>,
}

impl LowPassFilter {
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            cutoff_hz,
            value: 0.0,
            last_update: None,
        }
    }

    /// Last output without advancing the filter.
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    /// Re-tunes the corner frequency; state carries over.
    pub fn set_cutoff_hz(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz;
    }

    /// Feeds one sample stamped with the current wall clock.
    pub fn update(&mut self, x: f32) -> f32 {
        self.update_at(x, Instant::now())
    }

    /// Feeds one sample at an explicit timestamp.
    ///
    /// On the first sample, or after a gap longer than
    /// [`STALL_RESET`](crate::STALL_RESET), the filter snaps to `x`.
    pub fn update_at(&mut self, x: f32, now: Instant) -> f32 {
        let dt = self
            .last_update
            .map(|prev| now.saturating_duration_since(prev));
        self.last_update = Some(now);

        match dt {
            Some(dt) if dt <= STALL_RESET => {
                let dt = dt.as_secs_f32();
                let alpha = dt / (1.0 / self.cutoff_hz + dt);
                self.value = alpha * x + (1.0 - alpha) * self.value;
            }
            _ => self.value = x,
        }
        self.value
    }
}

impl Destroyable for LowPassFilter {
    fn destroy(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    #[test]
    fn test_first_sample_snaps() {
        let mut lpf = LowPassFilter::new(10.0);
        assert_relative_eq!(lpf.update_at(5.0, Instant::now()), 5.0);
    }

    #[test]
    fn test_converges_monotonically_to_constant_input() {
        let mut lpf = LowPassFilter::new(10.0);
        let t0 = Instant::now();
        lpf.update_at(0.0, t0);

        let mut prev = 0.0;
        for i in 1..=200u32 {
            let out = lpf.update_at(1.0, t0 + Duration::from_millis(10 * i as u64));
            assert!(out >= prev, "output regressed at step {i}: {out} < {prev}");
            assert!(out <= 1.0);
            prev = out;
        }
        assert_relative_eq!(prev, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_snaps_after_stall() {
        let mut lpf = LowPassFilter::new(1.0);
        let t0 = Instant::now();
        lpf.update_at(0.0, t0);
        lpf.update_at(0.2, t0 + Duration::from_millis(10));

        // >1s gap: no slewing, output is exactly the new input
        let out = lpf.update_at(7.5, t0 + Duration::from_millis(1500));
        assert_relative_eq!(out, 7.5);
    }

    #[test]
    fn test_zero_dt_keeps_output() {
        let mut lpf = LowPassFilter::new(10.0);
        let t0 = Instant::now();
        lpf.update_at(3.0, t0);
        assert_relative_eq!(lpf.update_at(100.0, t0), 3.0);
    }

    #[test]
    fn test_higher_cutoff_tracks_faster() {
        let t0 = Instant::now();
        let mut slow = LowPassFilter::new(1.0);
        let mut fast = LowPassFilter::new(50.0);
        slow.update_at(0.0, t0);
        fast.update_at(0.0, t0);

        let t1 = t0 + Duration::from_millis(10);
        assert!(fast.update_at(1.0, t1) > slow.update_at(1.0, t1));
    }
}
