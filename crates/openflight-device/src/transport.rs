//! The shared device transport.

use crate::backend::HidapiBackend;
use crate::DeviceResult;
use hid_rhino_protocol::{
    BlockLoadReport, CreateEffectReport, DeviceControlCommand, DeviceControlReport,
    DeviceGainReport, EffectType, FIRMWARE_VERSION_LEN, HID_REPORT_ID_INPUT,
    HID_REPORT_ID_PID_BLOCK_LOAD, HID_REPORT_ID_PID_STATE, InputReport, LoadStatus, PRODUCT_ID,
    PidStateReport, USB_CTRL_REQ_GET_VERSION, VENDOR_ID,
};
use openflight_hid_common::{HidBackend, HidDeviceInfo};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One Rhino device, shared behind `Arc` by every effect handle and
/// telemetry path.
///
/// All HID I/O serializes through the backend mutex; that is sufficient for
/// the handful of producer threads a simulator session runs, since HID
/// latency dominates any lock contention. The transport does not track
/// effects: each allocated slot is owned by exactly one
/// [`crate::EffectHandle`].
pub struct RhinoDevice {
    backend: Mutex<Box<dyn HidBackend>>,
    in_reports: Mutex<HashMap<u8, Vec<u8>>>,
    info: HidDeviceInfo,
}

impl RhinoDevice {
    /// Opens a device by vendor/product id and optional serial string.
    ///
    /// # Errors
    ///
    /// Fails when no matching device is present or cannot be opened.
    pub fn open(vendor_id: u16, product_id: u16, serial: Option<&str>) -> DeviceResult<Arc<Self>> {
        info!("Open Rhino HID {vendor_id:04X}:{product_id:04X}");
        let backend = HidapiBackend::open(vendor_id, product_id, serial)?;
        Ok(Self::from_backend(Box::new(backend)))
    }

    /// Opens the default Rhino (`FFFF:2055`).
    ///
    /// # Errors
    ///
    /// Fails when no matching device is present or cannot be opened.
    pub fn open_default() -> DeviceResult<Arc<Self>> {
        Self::open(VENDOR_ID, PRODUCT_ID, None)
    }

    /// Wraps an already-opened backend. Tests pass a mock here.
    pub fn from_backend(backend: Box<dyn HidBackend>) -> Arc<Self> {
        let info = backend.info().clone();
        Arc::new(Self {
            backend: Mutex::new(backend),
            in_reports: Mutex::new(HashMap::new()),
            info,
        })
    }

    pub fn info(&self) -> &HidDeviceInfo {
        &self.info
    }

    /// Writes one output report.
    ///
    /// # Errors
    ///
    /// A failed write means the report did not take effect; callers log and
    /// move on rather than retrying against unknown device state.
    pub(crate) fn write(&self, data: &[u8]) -> DeviceResult<()> {
        self.backend.lock().write_output(data)?;
        Ok(())
    }

    /// Runs the allocation handshake for one effect slot of the given type.
    ///
    /// Pool exhaustion is a normal, recoverable condition: the handshake
    /// succeeds but reports a full pool, and this returns `Ok(None)` after
    /// logging a warning. Callers treat a missing slot as "silently does
    /// nothing".
    ///
    /// # Errors
    ///
    /// Fails only on transport-level I/O problems.
    pub fn allocate_block(&self, effect_type: EffectType) -> DeviceResult<Option<u8>> {
        let raw = {
            let mut backend = self.backend.lock();
            backend.send_feature(&CreateEffectReport { effect_type }.encode())?;
            backend.get_feature(HID_REPORT_ID_PID_BLOCK_LOAD, 5)?
        };
        let load = BlockLoadReport::decode(&raw)?;

        match load.load_status {
            LoadStatus::Success => {
                debug!(
                    effect_id = load.effect_block_index,
                    effect_type = effect_type.name(),
                    "Allocated effect block"
                );
                Ok(Some(load.effect_block_index))
            }
            status => {
                warn!(
                    ?status,
                    effect_type = effect_type.name(),
                    "Effects pool full, cannot create new effect"
                );
                Ok(None)
            }
        }
    }

    /// Drains all pending input reports, keeping only the latest per report
    /// id. Stale queued reports would only add latency.
    ///
    /// # Errors
    ///
    /// Fails on a transport-level read error (e.g. device unplugged).
    pub fn poll_reports(&self) -> DeviceResult<()> {
        let mut backend = self.backend.lock();
        let mut in_reports = self.in_reports.lock();
        while let Some(report) = backend.read_input()? {
            if let Some(&id) = report.first() {
                in_reports.insert(id, report);
            }
        }
        Ok(())
    }

    /// Latest raw report for `report_id`, if any has arrived.
    pub fn report(&self, report_id: u8) -> Option<Vec<u8>> {
        self.in_reports.lock().get(&report_id).cloned()
    }

    /// Latest decoded joystick input report.
    pub fn input(&self) -> Option<InputReport> {
        let raw = self.report(HID_REPORT_ID_INPUT)?;
        match InputReport::decode(&raw) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Discarding malformed input report: {e}");
                None
            }
        }
    }

    /// Latest decoded PID state report.
    pub fn pid_state(&self) -> Option<PidStateReport> {
        let raw = self.report(HID_REPORT_ID_PID_STATE)?;
        match PidStateReport::decode(&raw) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Discarding malformed PID state report: {e}");
                None
            }
        }
    }

    /// Sends one device-control subcommand.
    ///
    /// # Errors
    ///
    /// Fails when the write does not reach the device.
    pub fn device_control(&self, command: DeviceControlCommand) -> DeviceResult<()> {
        self.write(&DeviceControlReport { command }.encode())
    }

    /// Resets all device-side effect state, with a short settle delay so the
    /// firmware finishes before the next allocation arrives.
    ///
    /// # Errors
    ///
    /// Fails when the write does not reach the device.
    pub fn reset_effects(&self) -> DeviceResult<()> {
        info!("FFB: Reset device effects");
        self.device_control(DeviceControlCommand::Reset)?;
        std::thread::sleep(Duration::from_millis(10));
        Ok(())
    }

    /// Sets the global device gain (0..4096).
    ///
    /// # Errors
    ///
    /// Fails when the write does not reach the device.
    pub fn set_device_gain(&self, gain: u16) -> DeviceResult<()> {
        self.write(&DeviceGainReport { gain }.encode())
    }

    /// Reads the firmware version string over the vendor control channel.
    ///
    /// # Errors
    ///
    /// Fails when the control endpoint is unreachable.
    pub fn firmware_version(&self) -> DeviceResult<String> {
        let raw = self
            .backend
            .lock()
            .control_read_vendor(USB_CTRL_REQ_GET_VERSION, FIRMWARE_VERSION_LEN)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }
}

impl std::fmt::Debug for RhinoDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhinoDevice").field("info", &self.info).finish()
    }
}
