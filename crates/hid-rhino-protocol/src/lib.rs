//! HID protocol implementation for VPforce Rhino force-feedback devices.
//!
//! The Rhino family (joystick bases, collectives, pedals) exposes force
//! feedback over direct USB HID access using a vendor flavour of the USB HID
//! PID (Physical Interface Device) report set. Talking to it directly
//! bypasses DirectInput, which lets an application layer additional effects
//! on top of whatever the simulator itself drives.
//!
//! ## Protocol notes
//!
//! - Effects live in a small, finite on-device pool. An effect is allocated
//!   with a `CreateEffect` feature report followed by a `PidBlockLoad`
//!   feature read that returns the assigned block index (or a pool-full
//!   status), and released with a `BlockFree` output report.
//! - Effect parameters travel in byte-packed little-endian output reports
//!   (`SetEffect`, `SetPeriodic`, `SetConstantForce`, `SetCondition`), each
//!   starting with a one-byte report id. Force and coefficient fields use a
//!   ±4096 fixed-point range.
//! - The input report (id 1) carries the signed 16-bit stick axes, button
//!   bitfields and hat switches. The PID state report (id 2) mirrors the
//!   device's effect/actuator status bits.
//! - The firmware version is a 64-byte ASCII string read via a USB vendor
//!   control transfer (request 16), outside the HID layer.
//!
//! This crate is pure encode/decode: no I/O, no device state. Every force
//! field is clamped deterministically to its hardware range on encode.

pub mod ids;
pub mod input;
pub mod output;
pub mod types;

pub use ids::*;
pub use input::*;
pub use output::*;
pub use types::*;

use openflight_hid_common::HidCommonError;
use thiserror::Error;

/// Errors returned by Rhino protocol operations.
#[derive(Error, Debug)]
pub enum RhinoProtocolError {
    #[error("Invalid report size: expected {expected}, got {actual}")]
    InvalidReportSize { expected: usize, actual: usize },

    #[error("Unexpected report id: expected {expected}, got {actual}")]
    UnexpectedReportId { expected: u8, actual: u8 },

    #[error("Unknown effect type: {0}")]
    UnknownEffectType(u8),

    #[error("Unknown block-load status: {0}")]
    UnknownLoadStatus(u8),

    #[error("Unknown effect operation: {0}")]
    UnknownOperation(u8),

    #[error("Report I/O error: {0}")]
    Common(#[from] HidCommonError),
}

/// Convenience result alias for Rhino protocol operations.
pub type RhinoProtocolResult<T> = Result<T, RhinoProtocolError>;

/// Default VPforce Rhino USB Vendor ID.
pub const VENDOR_ID: u16 = 0xFFFF;
/// Default VPforce Rhino USB Product ID.
pub const PRODUCT_ID: u16 = 0x2055;

/// Full scale of the device's fixed-point force/coefficient range.
pub const FORCE_SCALE: i16 = 4096;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ids() {
        assert_eq!(VENDOR_ID, 0xFFFF);
        assert_eq!(PRODUCT_ID, 0x2055);
        assert_eq!(FORCE_SCALE, 4096);
    }
}
