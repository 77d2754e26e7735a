//! Report ids and wire-level constants for the Rhino HID PID protocol.

/// Input report: stick axes, buttons, hats.
pub const HID_REPORT_ID_INPUT: u8 = 1;
/// PID state report: actuator/effect status bits.
pub const HID_REPORT_ID_PID_STATE: u8 = 2;
/// Feature report (write): request allocation of one effect slot.
pub const HID_REPORT_ID_CREATE_EFFECT: u8 = 5;
/// Feature report (read): allocation result for the last create request.
pub const HID_REPORT_ID_PID_BLOCK_LOAD: u8 = 6;
/// Feature report (read): effect pool usage.
pub const HID_REPORT_ID_PID_POOL: u8 = 7;

/// Output report: effect definition (type, duration, gain, direction).
pub const HID_REPORT_ID_SET_EFFECT: u8 = 101;
/// Output report: attack/fade envelope.
pub const HID_REPORT_ID_SET_ENVELOPE: u8 = 102;
/// Output report: per-axis condition block (spring/damper/friction/inertia).
pub const HID_REPORT_ID_SET_CONDITION: u8 = 103;
/// Output report: periodic waveform parameters.
pub const HID_REPORT_ID_SET_PERIODIC: u8 = 104;
/// Output report: constant force magnitude.
pub const HID_REPORT_ID_SET_CONSTANT_FORCE: u8 = 105;
/// Output report: ramp force parameters.
pub const HID_REPORT_ID_SET_RAMP_FORCE: u8 = 106;
/// Output report: start/stop one effect.
pub const HID_REPORT_ID_EFFECT_OPERATION: u8 = 110;
/// Output report: release one effect slot back to the pool.
pub const HID_REPORT_ID_BLOCK_FREE: u8 = 111;
/// Output report: device-level control (reset, pause, actuators).
pub const HID_REPORT_ID_DEVICE_CONTROL: u8 = 112;
/// Output report: global device gain.
pub const HID_REPORT_ID_DEVICE_GAIN: u8 = 113;

/// Axis-enable bit: apply effect on the X axis.
pub const AXIS_ENABLE_X: u8 = 1;
/// Axis-enable bit: apply effect on the Y axis.
pub const AXIS_ENABLE_Y: u8 = 2;
/// Axis-enable bit: use the polar direction fields instead of per-axis flags.
pub const AXIS_ENABLE_DIR: u8 = 4;

/// USB request type: device-to-host direction bit.
pub const USB_REQTYPE_DEVICE_TO_HOST: u8 = 0x80;
/// USB request type: vendor-defined request class.
pub const USB_REQTYPE_VENDOR: u8 = 0x40;
/// Vendor control request: read the firmware version string.
pub const USB_CTRL_REQ_GET_VERSION: u8 = 16;
/// Length of the firmware version control response.
pub const FIRMWARE_VERSION_LEN: usize = 64;
