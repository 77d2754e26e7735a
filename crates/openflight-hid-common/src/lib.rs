//! Common abstractions for USB HID device communication in OpenFlightFFB.
//!
//! This crate holds the pieces shared by the protocol and device layers:
//! byte-level report building/parsing, device identification, and the
//! [`HidBackend`] trait the transport is generic over. A [`mock`] backend
//! records traffic so the effect lifecycle can be tested without hardware.

pub mod backend;
pub mod device_info;
pub mod report_io;

pub use backend::{HidBackend, mock};
pub use device_info::HidDeviceInfo;
pub use report_io::{ReportBuilder, ReportParser};

use thiserror::Error;

/// Errors shared by HID-layer operations.
#[derive(Error, Debug)]
pub enum HidCommonError {
    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("HID write failed: {0}")]
    WriteError(String),

    #[error("HID read failed: {0}")]
    ReadError(String),

    #[error("Feature report failed: {0}")]
    FeatureError(String),

    #[error("USB control transfer failed: {0}")]
    ControlTransfer(String),

    #[error("Invalid report: {0}")]
    InvalidReport(String),
}

/// Convenience result alias for HID-layer operations.
pub type HidCommonResult<T> = Result<T, HidCommonError>;
