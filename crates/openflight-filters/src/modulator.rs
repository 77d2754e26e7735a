//! Direction sources for periodic and constant-force effects.

use openflight_dispenser::Destroyable;
use std::time::{Duration, Instant};

/// Where an effect's direction comes from.
///
/// Passing `RandomHop` makes the effect wrapper substitute a slowly-hopping
/// pseudo-random angle on every parameter update, which keeps several
/// simultaneous periodic effects from constructively interfering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    /// Plain angle in degrees.
    Fixed(f32),
    /// Re-randomized angle, held for `period` between hops.
    RandomHop { period: Duration },
}

impl From<f32> for Direction {
    fn from(degrees: f32) -> Self {
        Self::Fixed(degrees)
    }
}

/// Time-gated pseudo-random angle generator.
///
/// `update()` draws a fresh uniform angle in [0, 360) only when more than
/// `period` has elapsed since the last hop; within the window it returns the
/// held value. Slow hopping, not white noise.
#[derive(Debug, Clone)]
pub struct RandomDirectionModulator {
    period: Duration,
    value: f32,
    last_hop: Option<Instant>,
}

impl RandomDirectionModulator {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            value: 0.0,
            last_hop: None,
        }
    }

    /// Current angle, hopping if the hold period has expired.
    pub fn update(&mut self) -> f32 {
        self.update_at(Instant::now())
    }

    /// Current angle at an explicit timestamp. The first call always hops.
    pub fn update_at(&mut self, now: Instant) -> f32 {
        let expired = self
            .last_hop
            .is_none_or(|prev| now.saturating_duration_since(prev) > self.period);
        if expired {
            self.last_hop = Some(now);
            self.value = fastrand::f32() * 360.0;
        }
        self.value
    }
}

impl Destroyable for RandomDirectionModulator {
    fn destroy(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holds_value_within_period() {
        let mut m = RandomDirectionModulator::new(Duration::from_millis(100));
        let t0 = Instant::now();
        let first = m.update_at(t0);
        assert_eq!(m.update_at(t0 + Duration::from_millis(10)), first);
        assert_eq!(m.update_at(t0 + Duration::from_millis(99)), first);
    }

    #[test]
    fn test_output_always_in_range() {
        let mut m = RandomDirectionModulator::new(Duration::from_millis(1));
        let t0 = Instant::now();
        for i in 0..1000u32 {
            let angle = m.update_at(t0 + Duration::from_millis(2 * i as u64));
            assert!((0.0..360.0).contains(&angle), "angle out of range: {angle}");
        }
    }

    #[test]
    fn test_hops_eventually() {
        let mut m = RandomDirectionModulator::new(Duration::from_millis(10));
        let t0 = Instant::now();
        let first = m.update_at(t0);

        // Uniform draws over [0,360): 100 identical consecutive hops would be
        // astronomically unlikely.
        let changed = (1..=100u32).any(|i| {
            let angle = m.update_at(t0 + Duration::from_millis(20 * i as u64));
            (angle - first).abs() > f32::EPSILON
        });
        assert!(changed, "modulator never hopped");
    }

    #[test]
    fn test_direction_from_angle() {
        assert_eq!(Direction::from(90.0), Direction::Fixed(90.0));
    }
}
