//! Time derivative and derivative-feedback dampening.

use crate::lowpass::LowPassFilter;
use openflight_dispenser::Destroyable;
use std::collections::HashMap;
use std::time::Instant;

/// `dx/dt` between consecutive samples, optionally low-pass post-filtered to
/// denoise the raw difference quotient.
#[derive(Debug, Clone, Default)]
pub struct Derivative {
    prev_value: f32,
    prev_update: Option<Instant>,
    value: f32,
    lpf: Option<LowPassFilter>,
}

impl Derivative {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derivative whose output is smoothed by a low-pass at `filter_hz`.
    pub fn with_filter(filter_hz: f32) -> Self {
        Self {
            lpf: Some(LowPassFilter::new(filter_hz)),
            ..Self::default()
        }
    }

    /// Last output without advancing the filter.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Re-tunes the post-filter corner frequency, adding the post-filter if
    /// it was absent.
    pub fn set_filter_hz(&mut self, filter_hz: f32) {
        match &mut self.lpf {
            Some(lpf) => lpf.set_cutoff_hz(filter_hz),
            None => self.lpf = Some(LowPassFilter::new(filter_hz)),
        }
    }

    /// Feeds one sample stamped with the current wall clock.
    pub fn update(&mut self, x: f32) -> f32 {
        self.update_at(x, Instant::now())
    }

    /// Feeds one sample at an explicit timestamp. The first sample yields 0.
    pub fn update_at(&mut self, x: f32, now: Instant) -> f32 {
        let dt = self
            .prev_update
            .map(|prev| now.saturating_duration_since(prev).as_secs_f32());
        let dx = x - self.prev_value;
        self.prev_value = x;
        self.prev_update = Some(now);

        match dt {
            Some(dt) if dt > 0.0 => {
                let mut val = dx / dt;
                if let Some(lpf) = &mut self.lpf {
                    val = lpf.update_at(val, now);
                }
                self.value = val;
            }
            // zero dt or first sample: keep the previous output
            _ => {}
        }
        self.value
    }
}

impl Destroyable for Derivative {
    fn destroy(&mut self) {}
}

struct DampenerEntry {
    derivative: Derivative,
    filter_hz: f32,
}

/// Derivative-feedback dampener for position-following control loops.
///
/// `dampen(name, v, hz, k)` returns `v − k·dv/dt`, suppressing oscillation
/// and overshoot. Entries are keyed by name so multiple independent dampened
/// quantities share one pool.
#[derive(Default)]
pub struct Dampener {
    pool: HashMap<String, DampenerEntry>,
}

impl Dampener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies derivative feedback to `value`, stamped with the current wall
    /// clock.
    pub fn dampen(&mut self, name: &str, value: f32, derivative_hz: f32, k: f32) -> f32 {
        self.dampen_at(name, value, derivative_hz, k, Instant::now())
    }

    /// Applies derivative feedback to `value` at an explicit timestamp.
    pub fn dampen_at(
        &mut self,
        name: &str,
        value: f32,
        derivative_hz: f32,
        k: f32,
        now: Instant,
    ) -> f32 {
        let entry = self
            .pool
            .entry(name.to_string())
            .or_insert_with(|| DampenerEntry {
                derivative: Derivative::with_filter(derivative_hz),
                filter_hz: derivative_hz,
            });

        if (entry.filter_hz - derivative_hz).abs() > f32::EPSILON {
            entry.derivative.set_filter_hz(derivative_hz);
            entry.filter_hz = derivative_hz;
        }

        value - k * entry.derivative.update_at(value, now)
    }
}

impl Destroyable for Dampener {
    fn destroy(&mut self) {}
}
