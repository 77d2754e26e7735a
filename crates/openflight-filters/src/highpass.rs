//! RC-model high-pass filter.

use crate::STALL_RESET;
use openflight_dispenser::Destroyable;
use std::f32::consts::TAU;
use std::time::Instant;

/// First-order high-pass over an irregular sample stream.
///
/// `RC = 1 / (2π·cutoff)`, `alpha = RC / (RC + dt)`,
/// `y ← alpha · (y + x − x_prev)`. Passes transients, decays steady-state
/// input toward zero.
#[derive(Debug, Clone)]
pub struct HighPassFilter {
    rc: f32,
    value: f32,
    last_input: f32,
    last_update: Option<Instant>,
}

impl HighPassFilter {
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            rc: 1.0 / (TAU * cutoff_hz),
            value: 0.0,
            last_input: 0.0,
            last_update: None,
        }
    }

    /// Last output without advancing the filter.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Forgets the timestamp so the next sample re-initializes the filter.
    pub fn reset(&mut self) {
        self.last_update = None;
    }

    /// Feeds one sample stamped with the current wall clock.
    pub fn update(&mut self, x: f32) -> f32 {
        self.update_at(x, Instant::now())
    }

    /// Feeds one sample at an explicit timestamp.
    ///
    /// On the first sample, or after a gap longer than
    /// [`STALL_RESET`](crate::STALL_RESET), output snaps to `x` (the step
    /// itself is treated as history, not as a transient).
    pub fn update_at(&mut self, x: f32, now: Instant) -> f32 {
        let dt = self
            .last_update
            .map(|prev| now.saturating_duration_since(prev));
        self.last_update = Some(now);

        match dt {
            Some(dt) if dt <= STALL_RESET => {
                let alpha = self.rc / (self.rc + dt.as_secs_f32());
                self.value = alpha * (self.value + x - self.last_input);
            }
            _ => self.value = x,
        }
        self.last_input = x;
        self.value
    }
}

impl Destroyable for HighPassFilter {
    fn destroy(&mut self) {}
}
