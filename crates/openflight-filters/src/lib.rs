//! Streaming filters for the OpenFlightFFB telemetry pipeline.
//!
//! Telemetry arrives as an irregular, wall-clock-driven sample stream, so
//! every filter here recomputes its smoothing factor from the measured `dt`
//! on each update instead of assuming a fixed sample rate. The filter set:
//!
//! - **Low-pass**: exponential smoothing, `alpha = dt / (1/f + dt)`
//! - **High-pass**: RC model, `alpha = RC / (RC + dt)`
//! - **Derivative**: `dx/dt`, optionally low-pass post-filtered
//! - **Dampener**: name-keyed derivative feedback for oscillation damping
//! - **Direction modulator**: slowly-hopping pseudo-random angle source
//!
//! After a stall longer than [`STALL_RESET`] (simulator pause, telemetry
//! drop-out) filters snap to the new input rather than slewing, so a resume
//! never produces a false force transient.
//!
//! Every filter exposes `update(x)` for production use and `update_at(x,
//! now)` so tests can drive a synthetic clock.

pub mod derivative;
pub mod highpass;
pub mod lowpass;
pub mod modulator;

pub use derivative::{Dampener, Derivative};
pub use highpass::HighPassFilter;
pub use lowpass::LowPassFilter;
pub use modulator::{Direction, RandomDirectionModulator};

use std::time::Duration;

/// Gap beyond which a filter treats the stream as restarted and snaps to the
/// incoming sample.
pub const STALL_RESET: Duration = Duration::from_secs(1);
