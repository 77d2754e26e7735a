//! Effect, operation and status enums shared across report types.

use crate::RhinoProtocolError;
use serde::{Deserialize, Serialize};

/// Hardware effect types, by PID effect type index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EffectType {
    Constant = 1,
    Ramp = 2,
    Square = 3,
    Sine = 4,
    Triangle = 5,
    SawtoothUp = 6,
    SawtoothDown = 7,
    Spring = 8,
    Damper = 9,
    Inertia = 10,
    Friction = 11,
    Custom = 12,
}

impl EffectType {
    /// True for waveform effects parameterized by `SetPeriodic`.
    pub fn is_periodic(self) -> bool {
        matches!(
            self,
            Self::Square | Self::Sine | Self::Triangle | Self::SawtoothUp | Self::SawtoothDown
        )
    }

    /// True for per-axis condition effects parameterized by `SetCondition`.
    pub fn is_condition(self) -> bool {
        matches!(
            self,
            Self::Spring | Self::Damper | Self::Inertia | Self::Friction
        )
    }

    /// Human-readable name used in lifecycle log messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Constant => "Constant",
            Self::Ramp => "Ramp",
            Self::Square => "Square",
            Self::Sine => "Sine",
            Self::Triangle => "Triangle",
            Self::SawtoothUp => "Sawtooth Up",
            Self::SawtoothDown => "Sawtooth Down",
            Self::Spring => "Spring",
            Self::Damper => "Damper",
            Self::Inertia => "Inertia",
            Self::Friction => "Friction",
            Self::Custom => "Custom",
        }
    }
}

impl TryFrom<u8> for EffectType {
    type Error = RhinoProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Constant),
            2 => Ok(Self::Ramp),
            3 => Ok(Self::Square),
            4 => Ok(Self::Sine),
            5 => Ok(Self::Triangle),
            6 => Ok(Self::SawtoothUp),
            7 => Ok(Self::SawtoothDown),
            8 => Ok(Self::Spring),
            9 => Ok(Self::Damper),
            10 => Ok(Self::Inertia),
            11 => Ok(Self::Friction),
            12 => Ok(Self::Custom),
            other => Err(RhinoProtocolError::UnknownEffectType(other)),
        }
    }
}

/// Result of an effect allocation request (`PidBlockLoad` feature read).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LoadStatus {
    Success = 1,
    Full = 2,
    Error = 3,
}

impl TryFrom<u8> for LoadStatus {
    type Error = RhinoProtocolError;

    fn try_from(value: u8) -> Result<Self, RhinoProtocolError> {
        match value {
            1 => Ok(Self::Success),
            2 => Ok(Self::Full),
            3 => Ok(Self::Error),
            other => Err(RhinoProtocolError::UnknownLoadStatus(other)),
        }
    }
}

/// Operation selector for the `EffectOperation` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EffectOp {
    Start = 1,
    StartSolo = 2,
    Stop = 3,
    /// Start with exclusive-use semantics; mutually-exclusive spring effects
    /// use this to displace the device's built-in spring.
    StartOverride = 4,
}

/// Subcommands of the `DeviceControl` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeviceControlCommand {
    DisableActuators = 1,
    EnableActuators = 2,
    StopAllEffects = 3,
    Reset = 4,
    Pause = 5,
    Continue = 6,
}

/// Converts an angle in degrees to the wire direction byte (0..255 ≙ 0..360°).
pub fn direction_to_wire(direction_deg: f32) -> u8 {
    let wrapped = direction_deg.rem_euclid(360.0);
    ((wrapped * 255.0 / 360.0).round() as u16).min(255) as u8
}

/// Converts a normalized magnitude to the device's fixed-point scale.
///
/// The input is expected in [-1, 1]; scaling is exact at the endpoints
/// (±1 → ±4096).
pub fn magnitude_to_fixed(magnitude: f32) -> i16 {
    (magnitude * 4096.0).round().clamp(-4096.0, 4096.0) as i16
}

/// Converts a periodic frequency in Hz to the wire period in milliseconds.
///
/// Zero frequency means "flat" and encodes as a zero period.
pub fn frequency_to_period_ms(frequency_hz: f32) -> u16 {
    if frequency_hz <= 0.0 {
        0
    } else {
        (1000.0 / frequency_hz).round().clamp(0.0, u16::MAX as f32) as u16
    }
}
