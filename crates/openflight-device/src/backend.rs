//! Hardware-backed [`HidBackend`] using hidapi for HID traffic and rusb for
//! the vendor control channel.

use hid_rhino_protocol::{USB_REQTYPE_DEVICE_TO_HOST, USB_REQTYPE_VENDOR};
use openflight_hid_common::{HidBackend, HidCommonError, HidCommonResult, HidDeviceInfo};
use std::time::Duration;

const CONTROL_TIMEOUT: Duration = Duration::from_millis(500);
const INPUT_REPORT_BUF: usize = 64;

/// One opened Rhino HID connection.
pub struct HidapiBackend {
    device: hidapi::HidDevice,
    info: HidDeviceInfo,
}

impl HidapiBackend {
    /// Opens the device by vendor/product id and optional serial string.
    ///
    /// The connection is switched to non-blocking reads; input polling
    /// drains the OS buffer without stalling the control loop.
    ///
    /// # Errors
    ///
    /// Fails when hidapi cannot initialize or no matching device is present.
    pub fn open(vendor_id: u16, product_id: u16, serial: Option<&str>) -> HidCommonResult<Self> {
        let api = hidapi::HidApi::new().map_err(|e| HidCommonError::OpenFailed(e.to_string()))?;
        let device = match serial {
            Some(serial) => api.open_serial(vendor_id, product_id, serial),
            None => api.open(vendor_id, product_id),
        }
        .map_err(|e| {
            HidCommonError::DeviceNotFound(format!(
                "{vendor_id:04X}:{product_id:04X}: {e}"
            ))
        })?;
        device
            .set_blocking_mode(false)
            .map_err(|e| HidCommonError::OpenFailed(e.to_string()))?;

        let mut info = HidDeviceInfo::new(vendor_id, product_id);
        if let Ok(Some(product)) = device.get_product_string() {
            info = info.with_product_name(product);
        }
        if let Some(serial) = serial {
            info = info.with_serial(serial);
        }

        Ok(Self { device, info })
    }
}

impl HidBackend for HidapiBackend {
    fn write_output(&mut self, data: &[u8]) -> HidCommonResult<usize> {
        self.device
            .write(data)
            .map_err(|e| HidCommonError::WriteError(e.to_string()))
    }

    fn send_feature(&mut self, data: &[u8]) -> HidCommonResult<()> {
        self.device
            .send_feature_report(data)
            .map_err(|e| HidCommonError::FeatureError(e.to_string()))
    }

    fn get_feature(&mut self, report_id: u8, len: usize) -> HidCommonResult<Vec<u8>> {
        let mut buf = vec![0u8; len.max(1)];
        if let Some(first) = buf.first_mut() {
            *first = report_id;
        }
        let n = self
            .device
            .get_feature_report(&mut buf)
            .map_err(|e| HidCommonError::FeatureError(e.to_string()))?;
        buf.truncate(n);
        Ok(buf)
    }

    fn read_input(&mut self) -> HidCommonResult<Option<Vec<u8>>> {
        let mut buf = [0u8; INPUT_REPORT_BUF];
        match self.device.read_timeout(&mut buf, 0) {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(buf[..n].to_vec())),
            Err(e) => Err(HidCommonError::ReadError(e.to_string())),
        }
    }

    fn control_read_vendor(&mut self, request: u8, len: usize) -> HidCommonResult<Vec<u8>> {
        // The firmware version lives behind a vendor control request, which
        // hidapi cannot issue; go through libusb for this one transfer.
        let handle = rusb::open_device_with_vid_pid(self.info.vendor_id, self.info.product_id)
            .ok_or_else(|| {
                HidCommonError::ControlTransfer(format!(
                    "device {:04X}:{:04X} not reachable over libusb",
                    self.info.vendor_id, self.info.product_id
                ))
            })?;
        let mut buf = vec![0u8; len];
        let n = handle
            .read_control(
                USB_REQTYPE_DEVICE_TO_HOST | USB_REQTYPE_VENDOR,
                request,
                0,
                0,
                &mut buf,
                CONTROL_TIMEOUT,
            )
            .map_err(|e| HidCommonError::ControlTransfer(e.to_string()))?;
        buf.truncate(n);
        Ok(buf)
    }

    fn info(&self) -> &HidDeviceInfo {
        &self.info
    }
}
