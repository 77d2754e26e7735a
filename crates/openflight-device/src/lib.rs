//! Direct USB HID access to the force-feedback system on VPforce Rhino
//! devices.
//!
//! Going straight to the hardware bypasses DirectInput and the simulator's
//! own FFB path, which lets a telemetry-driven application augment whatever
//! the simulator outputs with additional effects. The layering:
//!
//! - [`RhinoDevice`]: the transport. One shared, mutex-serialized HID
//!   connection handling output reports, the effect-allocation feature
//!   handshake, input report polling, and the firmware version query.
//! - [`EffectHandle`]: exclusive owner of one hardware effect slot;
//!   start/stop/destroy with idempotent state transitions, per-type
//!   parameter setters, and byte-compare suppression of redundant writes.
//!   Dropping a handle frees its slot; the pool is small and finite, so
//!   reclamation is deterministic, not best-effort.
//! - [`HapticEffect`]: the semantic façade the telemetry layer talks to:
//!   lazily allocates on first use, survives pool exhaustion as a silent
//!   no-op, and folds in direction modulation.
//!
//! Effects and filters are shared across call sites through
//! [`openflight_dispenser::Dispenser`] registries; the aliases below cover
//! the common cases.

pub mod backend;
pub mod effect;
pub mod handle;
pub mod transport;

pub use effect::{HapticEffect, Periodic};
pub use handle::EffectHandle;
pub use transport::RhinoDevice;

use hid_rhino_protocol::RhinoProtocolError;
use openflight_dispenser::Dispenser;
use openflight_filters::{Dampener, HighPassFilter, LowPassFilter};
use openflight_hid_common::HidCommonError;
use thiserror::Error;

/// Errors returned by device transport and effect operations.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("HID error: {0}")]
    Hid(#[from] HidCommonError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] RhinoProtocolError),
}

/// Convenience result alias for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Named haptic effects shared across telemetry handlers for one session.
pub type EffectDispenser = Dispenser<HapticEffect>;
/// Named low-pass filters.
pub type LowPassDispenser = Dispenser<LowPassFilter>;
/// Named high-pass filters.
pub type HighPassDispenser = Dispenser<HighPassFilter>;
/// Named dampener pools.
pub type DampenerDispenser = Dispenser<Dampener>;
