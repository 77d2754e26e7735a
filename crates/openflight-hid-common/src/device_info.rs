//! Device identification for FFB joystick hardware.

use serde::{Deserialize, Serialize};

/// Identity of an opened (or discoverable) HID force-feedback device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HidDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: Option<String>,
    pub product_name: Option<String>,
}

impl HidDeviceInfo {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            serial_number: None,
            product_name: None,
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }

    /// Human-readable identifier used in log messages.
    pub fn display_name(&self) -> String {
        self.product_name
            .clone()
            .unwrap_or_else(|| format!("{:04X}:{:04X}", self.vendor_id, self.product_id))
    }
}
