//! Input-side report decoders (device → host).

use crate::ids::{HID_REPORT_ID_INPUT, HID_REPORT_ID_PID_STATE};
use crate::{RhinoProtocolError, RhinoProtocolResult};
use openflight_hid_common::ReportParser;
use serde::{Deserialize, Serialize};

/// Joystick input report (id 1): axes, buttons, hats.
///
/// The main X/Y axes use the same ±4096 fixed-point scale as the force
/// fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputReport {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub rz: u8,
    pub ry: u8,
    pub rx: u8,
    pub slider: u8,
    pub buttons: u32,
    pub buttons_aux: u16,
    pub hats: u16,
}

impl InputReport {
    pub const SIZE: usize = 19;

    /// Decodes an input report.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer or wrong report id.
    pub fn decode(data: &[u8]) -> RhinoProtocolResult<Self> {
        if data.len() < Self::SIZE {
            return Err(RhinoProtocolError::InvalidReportSize {
                expected: Self::SIZE,
                actual: data.len(),
            });
        }
        let mut p = ReportParser::new(data);
        let id = p.read_u8()?;
        if id != HID_REPORT_ID_INPUT {
            return Err(RhinoProtocolError::UnexpectedReportId {
                expected: HID_REPORT_ID_INPUT,
                actual: id,
            });
        }
        Ok(Self {
            x: p.read_i16_le()?,
            y: p.read_i16_le()?,
            z: p.read_i16_le()?,
            rz: p.read_u8()?,
            ry: p.read_u8()?,
            rx: p.read_u8()?,
            slider: p.read_u8()?,
            buttons: p.read_u32_le()?,
            buttons_aux: p.read_u16_le()?,
            hats: p.read_u16_le()?,
        })
    }

    /// Whether the 1-based button is currently pressed.
    ///
    /// Buttons 1..=32 live in `buttons`, 33..=48 in `buttons_aux`.
    pub fn is_button_pressed(&self, button_number: u8) -> bool {
        if button_number == 0 || button_number > 48 {
            return false;
        }
        let all = self.buttons as u64 | ((self.buttons_aux as u64) << 32);
        all & (1u64 << (button_number - 1)) != 0
    }

    /// Main X/Y axes scaled to [-1.0, 1.0].
    pub fn axis_xy(&self) -> (f32, f32) {
        (self.x as f32 / 4096.0, self.y as f32 / 4096.0)
    }
}

/// PID state report (id 2): device status flags plus the index of the
/// most recently reported effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PidStateReport {
    pub device_paused: bool,
    pub actuators_enabled: bool,
    pub safety_switch: bool,
    pub actuator_override: bool,
    pub actuator_power: bool,
    /// The device dropped all state; every host-side effect id is stale.
    pub device_reset_event: bool,
    pub effect_playing: bool,
    pub effect_block_index: u8,
}

impl PidStateReport {
    pub const SIZE: usize = 3;

    /// Decodes a PID state report.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer or wrong report id.
    pub fn decode(data: &[u8]) -> RhinoProtocolResult<Self> {
        if data.len() < Self::SIZE {
            return Err(RhinoProtocolError::InvalidReportSize {
                expected: Self::SIZE,
                actual: data.len(),
            });
        }
        let mut p = ReportParser::new(data);
        let id = p.read_u8()?;
        if id != HID_REPORT_ID_PID_STATE {
            return Err(RhinoProtocolError::UnexpectedReportId {
                expected: HID_REPORT_ID_PID_STATE,
                actual: id,
            });
        }
        let flags = p.read_u8()?;
        let playing = p.read_u8()?;
        Ok(Self {
            device_paused: flags & 0x01 != 0,
            actuators_enabled: flags & 0x02 != 0,
            safety_switch: flags & 0x04 != 0,
            actuator_override: flags & 0x08 != 0,
            actuator_power: flags & 0x10 != 0,
            device_reset_event: flags & 0x20 != 0,
            effect_playing: playing & 0x01 != 0,
            effect_block_index: playing >> 1,
        })
    }
}
